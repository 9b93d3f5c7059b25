use std::sync::Arc;

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Duration, Utc};

use psbthub_crypto::{
    encrypt, extract_fragment_key, generate_key_bytes, strip_fragment_key, CryptoProvider,
    OsRandom,
};
use psbthub_share::{
    AccessMode, CreateShareInput, MemoryShareRepository, PayloadFormat, PsbtValidator,
    SecurityMode, ShareConfig, ShareRepository, ShareService, PSBT_MAGIC,
};

const DELETE_HASH: &str = "0f007385b6f9d4b7eeb2748605afe1a984a0a3bfa3f014d09e2a784ce9e5cd1a";

fn psbt_bytes() -> Vec<u8> {
    let mut bytes = PSBT_MAGIC.to_vec();
    bytes.extend_from_slice(&[0x01, 0x00, 0x52, 0x02, 0x00, 0x00, 0x00, 0x01, 0xab, 0xcd]);
    bytes
}

fn psbt_base64() -> String {
    Base64::encode_string(&psbt_bytes())
}

fn setup() -> (Arc<MemoryShareRepository>, ShareService) {
    let repo = Arc::new(MemoryShareRepository::new());
    let config = ShareConfig {
        password_iterations: 100_000,
        share_base_url: "https://share.example/".into(),
        ..ShareConfig::default()
    };
    let service = ShareService::new(
        repo.clone(),
        Arc::new(PsbtValidator),
        CryptoProvider::system(),
        config,
    )
    .unwrap();
    (repo, service)
}

fn in_a_week() -> Option<DateTime<Utc>> {
    Some(Utc::now() + Duration::days(7))
}

fn fragment_of(url: &str) -> &str {
    url.split_once('#').map(|(_, f)| f).unwrap_or("")
}

fn path_id(url: &str) -> &str {
    let path = url.split('#').next().unwrap();
    path.rsplit('/').next().unwrap()
}

#[tokio::test]
async fn fragment_share_round_trip_and_delete() {
    let (repo, service) = setup();

    let created = service
        .create_share(&format!("psbt:{}", psbt_base64()), in_a_week(), SecurityMode::LinkFragment)
        .await
        .unwrap();
    assert!(created
        .share_url
        .starts_with(&format!("https://share.example/p/{}#k=", created.share_id)));
    assert_eq!(path_id(&created.share_url), created.share_id);
    assert!(created.expires_at_iso.ends_with('Z'));

    // Only ciphertext and an obfuscated size reach storage.
    let record = repo.get_share(&created.share_id).await.unwrap().unwrap();
    assert!(!record.ciphertext_payload.contains(&psbt_base64()));
    assert!(!record.ciphertext_payload.contains("keyDerivation"));
    let true_len = psbt_bytes().len() as u64;
    assert!(record.size_bytes >= true_len + 2048);
    assert!(record.size_bytes <= true_len + 16384);
    assert_eq!(record.version, 1);

    let fetched = service.fetch_share(&created.share_id).await.unwrap();
    assert!(!fetched.requires_password());

    let fragment = fragment_of(&created.share_url);
    let opened = service.open_with_fragment(&fetched, fragment).await.unwrap();
    assert_eq!(opened.artifact_base64, psbt_base64());
    assert_eq!(opened.artifact_bytes, psbt_bytes().len());
    assert_eq!(opened.access, AccessMode::LinkFragment);
    assert!(matches!(opened.format, PayloadFormat::V1Json { .. }));
    assert!(opened.can_delete());
    assert_eq!(strip_fragment_key(fragment), "");

    assert!(service.delete_share(&opened).await.unwrap());
    let err = service.fetch_share(&created.share_id).await.unwrap_err();
    assert_eq!(err.code(), "SHARE_NOT_FOUND");
    assert!(!service.delete_share(&opened).await.unwrap());
}

#[tokio::test]
async fn password_share_round_trip() {
    let (repo, service) = setup();

    let created = service
        .create_share(
            &hex::encode(psbt_bytes()),
            in_a_week(),
            SecurityMode::Password("  correct horse battery  ".into()),
        )
        .await
        .unwrap();
    assert_eq!(created.access, AccessMode::Password);
    assert_eq!(created.password.as_deref(), Some("correct horse battery"));
    assert!(!created.share_url.contains('#'));

    let record = repo.get_share(&created.share_id).await.unwrap().unwrap();
    assert!(record.ciphertext_payload.contains(r#""keyDerivation":{"type":"PBKDF2-SHA256""#));
    assert!(record.ciphertext_payload.contains(r#""iterations":100000"#));

    let fetched = service.fetch_share(&created.share_id).await.unwrap();
    assert!(fetched.requires_password());

    let err = service
        .open_with_password(&fetched, "wrong password")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DECRYPTION_FAILED");

    let err = service.open_with_password(&fetched, "   ").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_PASSWORD");

    let opened = service
        .open_with_password(&fetched, "correct horse battery")
        .await
        .unwrap();
    assert_eq!(opened.artifact_base64, psbt_base64());
    assert_eq!(opened.access, AccessMode::Password);
    assert!(service.delete_share(&opened).await.unwrap());
}

#[tokio::test]
async fn fragment_errors() {
    let (_repo, service) = setup();
    let created = service
        .create_share(&psbt_base64(), in_a_week(), SecurityMode::LinkFragment)
        .await
        .unwrap();
    let fetched = service.fetch_share(&created.share_id).await.unwrap();

    let err = service.open_with_fragment(&fetched, "#view=qr").await.unwrap_err();
    assert_eq!(err.code(), "MISSING_FRAGMENT_KEY");

    let err = service
        .open_with_fragment(&fetched, "#k=not-base64url!!")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_FRAGMENT_KEY");

    let other_key = psbthub_crypto::encode_key_for_fragment(
        generate_key_bytes(&OsRandom).unwrap().as_ref(),
    )
    .unwrap();
    let err = service
        .open_with_fragment(&fetched, &format!("#k={other_key}"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DECRYPTION_FAILED");

    let err = service
        .open_with_password(&fetched, "anything")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_ENVELOPE");
}

#[tokio::test]
async fn tampered_storage_is_rejected() {
    let (repo, service) = setup();
    let id = "AAAAAAAAAAAAAAAAAAAAAA";
    repo.insert_share(CreateShareInput {
        id: id.into(),
        ciphertext_payload: r#"{"version":1,"algorithm":"AES-GCM-256"}"#.into(),
        size_bytes: 4096,
        version: 1,
        expires_at: Utc::now() + Duration::hours(1),
        delete_token_hash: DELETE_HASH.into(),
    })
    .await
    .unwrap();

    let err = service.fetch_share(id).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_ENVELOPE");
}

#[tokio::test]
async fn legacy_raw_share_opens_without_delete_capability() {
    let (repo, service) = setup();
    let provider = CryptoProvider::system();
    let key = generate_key_bytes(&OsRandom).unwrap();
    let envelope = encrypt(&provider, &psbt_bytes(), &key, None).await.unwrap();

    let id = "legacyShare00000000000";
    repo.insert_share(CreateShareInput {
        id: id.into(),
        ciphertext_payload: envelope.serialize(),
        size_bytes: 8192,
        version: 1,
        expires_at: Utc::now() + Duration::hours(1),
        delete_token_hash: DELETE_HASH.into(),
    })
    .await
    .unwrap();

    let fetched = service.fetch_share(id).await.unwrap();
    let fragment = psbthub_crypto::build_fragment(
        &psbthub_crypto::encode_key_for_fragment(key.as_ref()).unwrap(),
    );
    assert_eq!(extract_fragment_key(&fragment).unwrap().len(), 43);

    let opened = service.open_with_fragment(&fetched, &fragment).await.unwrap();
    assert_eq!(opened.format, PayloadFormat::LegacyRaw);
    assert_eq!(opened.artifact_base64, psbt_base64());
    assert!(!opened.can_delete());

    let err = service.delete_share(&opened).await.unwrap_err();
    assert_eq!(err.code(), "DELETE_CAPABILITY_UNAVAILABLE");
}

#[tokio::test]
async fn oversized_artifact_rejected() {
    let repo = Arc::new(MemoryShareRepository::new());
    let config = ShareConfig {
        max_artifact_bytes: 8,
        ..ShareConfig::default()
    };
    let service =
        ShareService::new(repo.clone(), Arc::new(PsbtValidator), CryptoProvider::system(), config)
            .unwrap();

    let err = service
        .create_share(&psbt_base64(), in_a_week(), SecurityMode::LinkFragment)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TOO_LARGE");
    assert!(repo.is_empty());
}

#[tokio::test]
async fn defaults_service_creates_shares() {
    let repo = Arc::new(MemoryShareRepository::new());
    let service = ShareService::with_defaults(repo.clone());
    assert_eq!(service.config().max_artifact_bytes, 1024 * 1024);

    let created = service
        .create_share(&psbt_base64(), in_a_week(), SecurityMode::LinkFragment)
        .await
        .unwrap();
    assert!(created.share_url.starts_with("https://psbthub.app/p/"));
    assert_eq!(repo.len(), 1);
}
