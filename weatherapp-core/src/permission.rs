use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    FineLocation,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FineLocation => "fine location",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime permission checks and requests.
#[async_trait]
pub trait PermissionGate: Send {
    fn is_granted(&self, permission: Permission) -> bool;

    /// Ask for `permission`; resolves to whether it was granted.
    async fn request(&mut self, permission: Permission) -> bool;
}
