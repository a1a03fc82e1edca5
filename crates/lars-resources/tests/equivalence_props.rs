//! Property tests for attachment and resource equivalence.

use lars_client::{AssetType, Attachment, AttachmentType, LinkType};
use lars_core::{AssetId, AttachmentId};
use lars_resources::{attachments_equivalent, Resource, ResourceAttachment};
use proptest::prelude::*;

fn attachment_type() -> impl Strategy<Value = AttachmentType> {
    prop_oneof![
        Just(AttachmentType::Content),
        Just(AttachmentType::Thumbnail),
        Just(AttachmentType::Documentation),
        Just(AttachmentType::License),
    ]
}

fn link_type() -> impl Strategy<Value = Option<LinkType>> {
    prop_oneof![
        Just(None),
        Just(Some(LinkType::Direct)),
        Just(Some(LinkType::WebPage)),
    ]
}

/// Small domains so equal pairs turn up often.
fn attachment() -> impl Strategy<Value = Attachment> {
    (
        "[ab]{1,2}",
        attachment_type(),
        prop::option::of(0u32..3),
        link_type(),
        prop::option::of("https://h/[xy]"),
        prop::option::of("[0-9a-f]{4}"),
        any::<u64>(),
    )
        .prop_map(|(name, kind, crc, link_type, url, id, size)| Attachment {
            id: id.map(AttachmentId::new),
            asset_id: Some(AssetId::new("owner")),
            name,
            attachment_type: Some(kind),
            size,
            crc,
            url,
            link_type,
            ..Default::default()
        })
}

proptest! {
    #[test]
    fn equivalence_is_symmetric(a in attachment(), b in attachment()) {
        prop_assert_eq!(attachments_equivalent(&a, &b), attachments_equivalent(&b, &a));
    }

    #[test]
    fn equivalence_is_reflexive(a in attachment()) {
        prop_assert!(attachments_equivalent(&a, &a));
    }

    /// Backend-assigned fields never affect equivalence.
    #[test]
    fn backend_fields_are_ignored(a in attachment(), id in "[0-9a-f]{8}", size in any::<u64>()) {
        let mut b = a.clone();
        b.id = Some(AttachmentId::new(id));
        b.asset_id = None;
        b.size = size;
        b.upload_on = Some(chrono::Utc::now());
        prop_assert!(attachments_equivalent(&a, &b));
    }

    #[test]
    fn linked_and_hosted_are_never_equivalent(a in attachment(), kind in prop_oneof![Just(LinkType::Direct), Just(LinkType::Efd)]) {
        let mut hosted = a.clone();
        hosted.link_type = None;
        let mut linked = a;
        linked.link_type = Some(kind);
        prop_assert!(!attachments_equivalent(&hosted, &linked));
    }

    #[test]
    fn links_differ_by_url(a in attachment(), x in "[a-z]{3}", y in "[a-z]{3}") {
        prop_assume!(x != y);
        let mut first = a.clone();
        first.link_type = Some(LinkType::WebPage);
        first.url = Some(format!("https://{x}"));
        let mut second = first.clone();
        second.url = Some(format!("https://{y}"));
        prop_assert!(!attachments_equivalent(&first, &second));
    }

    #[test]
    fn hosted_content_is_compared_by_checksum(
        left in prop::collection::vec(any::<u8>(), 0..64),
        right in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let a = ResourceAttachment::with_bytes("c", AttachmentType::Content, left.clone());
        let b = ResourceAttachment::with_bytes("c", AttachmentType::Content, right.clone());
        let same_crc = crc32fast::hash(&left) == crc32fast::hash(&right);
        prop_assert_eq!(a.equivalent(b.meta()), same_crc);
    }

    /// Resource equivalence is symmetric too, whatever the description.
    #[test]
    fn resource_equivalence_is_symmetric(
        da in prop::option::of("[xy]"),
        db in prop::option::of("[xy]"),
        bytes in prop::collection::vec(any::<u8>(), 0..4),
    ) {
        let mut a = Resource::new(AssetType::Feature, "n").with_provider("p");
        a.common.description = da;
        a.add_attachment(ResourceAttachment::with_bytes("c", AttachmentType::Content, bytes.clone())).unwrap();
        let mut b = Resource::new(AssetType::Feature, "n").with_provider("p");
        b.common.description = db;
        b.add_attachment(ResourceAttachment::with_bytes("c", AttachmentType::Content, bytes)).unwrap();
        prop_assert_eq!(a.equivalent(&b), b.equivalent(&a));
        prop_assert_eq!(a.equivalent(&b), a.common.description == b.common.description);
    }
}
