//! Workflows that span the relational store and the collaborator services.

pub mod attachment;
pub mod folders;
pub mod resolver;

pub use attachment::AttachmentCoordinator;
pub use folders::FolderService;
pub use resolver::EntityResolver;
