// tests/policy_config.rs
use quake_watch::policy::{load_policy_default, load_policy_from, AlertPolicy};
use std::{env, fs};

#[test]
fn load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("policy.toml");
    fs::write(
        &p,
        r#"
magnitude_threshold = 4.5

[region]
name = "  Philippines "
lat_min = 4.5
lat_max = 21.5
lon_min = 116.0
lon_max = 127.0
"#,
    )
    .unwrap();
    let policy = load_policy_from(&p).unwrap();
    assert_eq!(policy.magnitude_threshold, 4.5);
    assert!(policy.region.matches_name("15 km SE of Davao, philippines"));
    assert!(policy.region.contains(10.0, 120.0));
}

#[test]
fn partial_region_keeps_default_bounds() {
    let policy = AlertPolicy::from_toml_str("[region]\nname = \"myanmar\"\n").unwrap();
    assert_eq!(policy.magnitude_threshold, 5.0);
    assert_eq!(policy.region.name, "myanmar");
    assert_eq!(policy.region.lat_min, 5.6);
    assert_eq!(policy.region.lon_max, 105.7);
}

#[test]
fn garbage_is_an_error() {
    assert!(AlertPolicy::from_toml_str("magnitude_threshold = \"big\"").is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var("QUAKE_POLICY_PATH");

    // 1) Nothing on disk -> built-in defaults
    assert_eq!(load_policy_default().unwrap(), AlertPolicy::default());

    // 2) Fallback to ./config/policy.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("policy.toml"), "magnitude_threshold = 6.0\n").unwrap();
    assert_eq!(load_policy_default().unwrap().magnitude_threshold, 6.0);

    // 3) Env wins over the fallback
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, "magnitude_threshold = 3.5\n").unwrap();
    env::set_var("QUAKE_POLICY_PATH", p_env.display().to_string());
    assert_eq!(load_policy_default().unwrap().magnitude_threshold, 3.5);

    // 4) Env pointing nowhere is an error, not a silent default
    env::set_var("QUAKE_POLICY_PATH", tmp.path().join("missing.toml").display().to_string());
    assert!(load_policy_default().is_err());
    env::remove_var("QUAKE_POLICY_PATH");

    env::set_current_dir(&old).unwrap();
}
