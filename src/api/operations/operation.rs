//! Write operation kinds

use crate::api::transport::Method;

/// What a pending write does to its entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    /// Entity without an id
    Create,
    /// Entity with an id
    Update,
    Delete,
}

impl WriteKind {
    /// Save kind implied by the presence of an id
    pub fn for_save(id: Option<u64>) -> Self {
        if id.is_some() { Self::Update } else { Self::Create }
    }

    pub fn http_method(&self) -> Method {
        match self {
            Self::Create => Method::Post,
            Self::Update => Method::Patch,
            Self::Delete => Method::Delete,
        }
    }

    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether a write of this kind must answer with data
    pub fn requires_response(&self) -> bool {
        !matches!(self, Self::Delete)
    }
}
