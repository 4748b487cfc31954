// Profile documents and the publish/load flow
//
// A profile is a JSON document in the blob store; the ledger only keeps its
// content hash and the display name.

use crate::blob::{BlobStore, BlobStoreExt, ContentHash};
use crate::registry::{Ledger, TxReceipt};
use crate::LabiError;
use serde::{Deserialize, Serialize};

pub const MAX_DISPLAY_NAME_CHARS: usize = 50;
pub const MAX_BIO_CHARS: usize = 200;
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Profile document stored in the blob store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub display_name: String,
    /// Content hash of the avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Milliseconds since epoch
    pub created_at: u64,
}

impl ProfileData {
    /// Trim and validate user input into a profile document
    pub fn new(display_name: &str, bio: Option<&str>) -> Result<Self, LabiError> {
        let display_name = display_name.trim();
        if display_name.is_empty() || display_name.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(LabiError::InvalidInput);
        }

        let bio = bio.map(str::trim).filter(|b| !b.is_empty());
        if bio.is_some_and(|b| b.chars().count() > MAX_BIO_CHARS) {
            return Err(LabiError::InvalidInput);
        }

        Ok(Self {
            display_name: display_name.to_string(),
            avatar: None,
            bio: bio.map(str::to_string),
            created_at: crate::now_millis(),
        })
    }
}

/// An image picked for upload
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl AvatarUpload {
    pub fn validate(&self) -> Result<(), LabiError> {
        if !self.mime.starts_with("image/") || self.bytes.len() > MAX_AVATAR_BYTES {
            return Err(LabiError::InvalidInput);
        }
        Ok(())
    }
}

/// Outcome of [`publish_profile`]
#[derive(Debug, Clone)]
pub struct PublishedProfile {
    pub profile: ProfileData,
    pub content_hash: ContentHash,
    pub receipt: TxReceipt,
}

/// Upload the avatar (if any) and the profile document, then point the
/// owner's on-chain profile at the document.
pub async fn publish_profile(
    blobs: &dyn BlobStore,
    ledger: &dyn Ledger,
    owner: &str,
    mut profile: ProfileData,
    avatar: Option<AvatarUpload>,
) -> Result<PublishedProfile, LabiError> {
    if let Some(ref avatar) = avatar {
        avatar.validate()?;
    }

    if let Some(avatar) = avatar {
        let avatar_hash = blobs.upload(avatar.bytes).await?;
        profile.avatar = Some(avatar_hash.to_string());
    }

    let content_hash = blobs.upload_json(&profile).await?;
    let receipt = ledger
        .set_profile(owner, content_hash.as_str(), &profile.display_name)
        .await?;

    tracing::info!("Published profile {} for {}", content_hash, owner);
    Ok(PublishedProfile {
        profile,
        content_hash,
        receipt,
    })
}

/// Fetch the profile document `address` points at, `None` if it never set one.
pub async fn load_profile(
    blobs: &dyn BlobStore,
    ledger: &dyn Ledger,
    address: &str,
) -> Result<Option<ProfileData>, LabiError> {
    let pointer = ledger.get_profile(address).await?;
    if !pointer.exists {
        return Ok(None);
    }

    let hash = ContentHash::parse(&pointer.content_hash)?;
    let profile = blobs.fetch_json(&hash).await?;
    Ok(Some(profile))
}

/// Gateway URL of a profile's avatar, if it has one
pub fn avatar_url(blobs: &dyn BlobStore, profile: &ProfileData) -> Option<String> {
    let hash = ContentHash::parse(profile.avatar.as_deref()?).ok()?;
    Some(blobs.gateway_url(&hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_validation() {
        let profile = ProfileData::new("  Alice  ", Some("  hi  ")).unwrap();
        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.bio.as_deref(), Some("hi"));

        assert!(ProfileData::new("   ", None).is_err());
        assert!(ProfileData::new(&"n".repeat(51), None).is_err());
        assert!(ProfileData::new(&"n".repeat(50), None).is_ok());
        assert!(ProfileData::new("Bob", Some(&"b".repeat(201))).is_err());

        let no_bio = ProfileData::new("Bob", Some("   ")).unwrap();
        assert_eq!(no_bio.bio, None);
    }

    #[test]
    fn test_avatar_validation() {
        let ok = AvatarUpload {
            mime: "image/png".into(),
            bytes: vec![0; 1024],
        };
        assert!(ok.validate().is_ok());

        let not_image = AvatarUpload {
            mime: "application/pdf".into(),
            bytes: vec![0; 10],
        };
        assert_eq!(not_image.validate(), Err(LabiError::InvalidInput));

        let too_big = AvatarUpload {
            mime: "image/jpeg".into(),
            bytes: vec![0; MAX_AVATAR_BYTES + 1],
        };
        assert_eq!(too_big.validate(), Err(LabiError::InvalidInput));
    }

    #[test]
    fn test_profile_json_shape() {
        let profile = ProfileData {
            display_name: "Alice".into(),
            avatar: None,
            bio: Some("gm".into()),
            created_at: 7,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["displayName"], "Alice");
        assert_eq!(json["createdAt"], 7);
        assert!(json.get("avatar").is_none());
    }
}
