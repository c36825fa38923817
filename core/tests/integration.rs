//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `Client` over real
//! HTTP with the default `ureq` transport. Validates that request building,
//! error translation and entity hydration agree with an actual server.

use std::net::SocketAddr;

use serde_json::json;
use weebsh_core::{
    ApiError, Client, ClientConfig, ImageQuery, ListQuery, Nsfw, TypesQuery, UploadOptions,
};

fn start_server() -> SocketAddr {
    // RUST_LOG=weebsh_core=debug shows each request.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
    });
    addr
}

fn client(addr: SocketAddr) -> Client {
    let config = ClientConfig::new(mock_server::TOKEN)
        .with_user_agent("weebsh-core-tests/0.1.0")
        .with_api_url(format!("http://{addr}"));
    Client::new(config).unwrap()
}

#[test]
fn image_lifecycle() {
    let client = client(start_server());
    let images = client.images();

    // Empty catalog: nothing visible yet.
    let types = images.types(&TypesQuery::default()).unwrap();
    assert!(types.types.is_empty());
    let err = images.random(&ImageQuery::new()).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound(_)), "{err:?}");

    // Upload by URL.
    let options = UploadOptions::default().tags(["cute"]).source("https://example.com");
    let mut image = images
        .upload("https://example.com/hug.gif", "hug", &options)
        .unwrap();
    assert_eq!(image.kind(), "hug");
    assert_eq!(image.mime_type(), "image/gif");
    assert!(image.has_tag("cute"));
    assert_eq!(image.source(), Some("https://example.com"));

    // Lookup by id equals the uploaded entity.
    let fetched = images.image(&image).unwrap();
    assert_eq!(fetched, image);

    // Filtered random selection.
    let random = images
        .random(&ImageQuery::new().kind("hug").tags(["cute"]).nsfw(Nsfw::Exclude))
        .unwrap();
    assert_eq!(random, image);
    assert_eq!(images.tags(false, Nsfw::Exclude).unwrap(), vec!["cute"]);

    // Tag mutation re-hydrates the entity.
    image.add_tag("soft").unwrap();
    assert!(image.has_tag("soft"));
    let err = image.add_tag("soft").unwrap_err();
    assert!(matches!(err, ApiError::DuplicateTag(_)), "{err:?}");
    image.remove_tag("cute").unwrap();
    assert!(!image.has_tag("cute"));

    let listed = images.list(&ListQuery::default()).unwrap();
    assert_eq!(listed, vec![image.clone()]);

    // Delete, after which the id is gone.
    image.delete().unwrap();
    let err = images.image(&image).unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound(_)), "{err:?}");
}

#[test]
fn service_errors_are_translated() {
    let client = client(start_server());

    let err = client
        .images()
        .upload("https://example.com/doc.pdf", "hug", &UploadOptions::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidMediaType(_)), "{err:?}");

    let err = client.images().image(mock_server::PRIVATE_IMAGE).unwrap_err();
    assert!(matches!(err, ApiError::PrivateResource(_)), "{err:?}");

    client.set_token("Wolke wrong");
    let err = client.images().tags(false, Nsfw::Exclude).unwrap_err();
    assert!(matches!(err, ApiError::BadCredentials(_)), "{err:?}");
}

#[test]
fn upload_of_local_file() {
    let client = client(start_server());
    let path = std::env::temp_dir().join(format!("weebsh-upload-{}.png", std::process::id()));
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nfake").unwrap();

    let options = UploadOptions::default()
        .tags(["cute", "soft"])
        .nsfw(true)
        .source("https://example.com/art");
    let result = client.images().upload(path.as_path(), "pat", &options);
    std::fs::remove_file(&path).unwrap();

    let image = result.unwrap();
    assert_eq!(image.kind(), "pat");
    assert_eq!(image.file_type(), "png");
    assert_eq!(image.mime_type(), "image/png");
    assert!(image.is_nsfw());
    assert!(image.has_tag("cute") && image.has_tag("soft"));
    assert_eq!(image.source(), Some("https://example.com/art"));
    assert_eq!(client.images().image(&image).unwrap(), image);
}

#[test]
fn upload_of_missing_file_sends_nothing() {
    let client = client(start_server());
    let err = client
        .images()
        .upload("./does/not/exist.png", "hug", &UploadOptions::default())
        .unwrap_err();
    match err {
        ApiError::FileAccess { reason, .. } => {
            assert_eq!(reason, weebsh_core::FileAccessReason::NotFound)
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn reputation_lifecycle() {
    let client = client(start_server());
    let bot = client.reputation().bot("bot");

    let mut alice = bot.user("alice").unwrap();
    let mut bob = bot.user("bob").unwrap();
    assert_eq!(bob.reputation(), 0);

    alice.give(&mut bob).unwrap();
    assert_eq!(bob.reputation(), 1);
    assert_eq!(alice.available_reputations(), Some(1));
    assert_eq!(alice.cooldown().len(), 1);

    bob.increase(4).unwrap();
    assert_eq!(bob.reputation(), 5);
    bob.decrease(2).unwrap();
    assert_eq!(bob.reputation(), 3);
    bob.reset(true).unwrap();
    assert_eq!(bob.reputation(), 0);

    // Giving by bare id still patches the source.
    let transfer = bot.give(&mut alice, "carol").unwrap();
    assert_eq!(transfer.target.reputation(), 1);
    assert_eq!(alice.available_reputations(), Some(0));

    let mut settings = client.reputation().settings().unwrap();
    settings.set_reputation_per_day(5);
    settings.save().unwrap();
    assert_eq!(client.reputation().settings().unwrap().reputation_per_day(), 5);
}

#[test]
fn bot_settings_lifecycle() {
    let client = client(start_server());
    let settings = client.settings();

    let mut setting = settings.set("guilds", "300", &json!({"prefix": "!"})).unwrap();
    assert_eq!(setting.data()["prefix"], "!");

    setting.set_data(json!({"prefix": "?"}));
    setting.save().unwrap();
    assert_eq!(settings.get("guilds", "300").unwrap().data()["prefix"], "?");

    setting.delete().unwrap();
    let err = settings.get("guilds", "300").unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404, .. }), "{err:?}");
}

#[test]
fn generated_images_are_raw_bytes() {
    let client = client(start_server());
    let image = client
        .auto_image()
        .generate("awooo", &Default::default())
        .unwrap();
    assert_eq!(image.content_type.as_deref(), Some("image/png"));
    assert!(image.data.starts_with(b"\x89PNG"));
}
