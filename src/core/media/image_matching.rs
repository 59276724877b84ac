use sha2::{Digest, Sha256};

/// Hex digest of raw image bytes. Only compared against other digests from this tool.
pub fn content_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub resource_name: String,
    pub name: String,
    pub url: String,
    pub digest: String,
}

/// Image assets of one customer with their content digests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageIndex {
    pub customer_id: String,
    pub images: Vec<IndexedImage>,
}

impl ImageIndex {
    /// Asset names are unique within an account.
    pub fn find_by_name(&self, name: &str) -> Option<&IndexedImage> {
        if name.is_empty() {
            return None;
        }
        self.images.iter().find(|image| image.name == name)
    }

    pub fn find_by_digest(&self, digest: &str) -> Option<&IndexedImage> {
        self.images.iter().find(|image| image.digest == digest)
    }

    /// Digest computed by an earlier listing, valid while the asset URL is unchanged.
    pub fn known_digest(&self, resource_name: &str, url: &str) -> Option<&str> {
        self.images
            .iter()
            .find(|image| image.resource_name == resource_name && image.url == url)
            .map(|image| image.digest.as_str())
    }
}
