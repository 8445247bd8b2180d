use stratus::{configure, global, reset_global, ConfigToml, Payload, DEFAULT_HUB_NAME};

#[test]
fn global_instance_lifecycle() {
    reset_global();
    let lazy = global();
    assert_eq!(lazy.hub().name(), DEFAULT_HUB_NAME);
    assert!(lazy.storage().is_err());

    let config = ConfigToml::from_str_with_defaults(
        "[storage]\nbucket = \"photos\"\nregion = \"eu-west-1\"",
    )
    .unwrap();
    let configured = configure(config).unwrap();
    assert!(configured.storage().is_ok());
    assert!(global().storage().is_ok());

    reset_global();
    assert!(global().storage().is_err());
    // Handles taken before the reset keep working.
    assert!(configured.storage().is_ok());
}

#[test]
fn configuring_announces_on_the_core_channel() {
    let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::<Payload>::new()));
    let sink = std::sync::Arc::clone(&events);
    let off = stratus::Hub::global().listen(
        "core",
        move |capsule: &stratus::Capsule| {
            if capsule.source == "Core" {
                sink.lock().unwrap().push(capsule.payload.clone());
            }
        },
        None,
    );

    stratus::Stratus::from_config(ConfigToml::default()).unwrap();
    off.unsubscribe();

    let events = events.lock().unwrap();
    assert!(events.iter().any(|payload| payload.event == "configured"
        && payload.message.as_deref() == Some("Stratus configured")));
}
