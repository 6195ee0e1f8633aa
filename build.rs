//! This build script does two things:
//! - it copies the `memory.x` file from the crate root into a directory where the linker can
//!   always find it, and passes the linker scripts for the firmware binary. Only done when
//!   building for the RP2040, host builds of the library and its tests do not need it.
//! - it generates `network_config.rs` from `config/network_config.json`, holding the station
//!   settings the firmware is built with.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::print_stdout)]

use std::{
    env, fs,
    fs::File,
    io,
    io::Write,
    net::Ipv4Addr,
    path::{Path, PathBuf},
};

/// Used when `config/network_config.json` does not exist, so a fresh checkout still builds
const DUMMY_CONFIG: &str = r#"{"ssid":"dummy","password":"dummy"}"#;

/// Fixed address of the controller, unless the config says otherwise
const DEFAULT_ADDRESS: &str = "192.168.4.2";

/// Netmask of the local network, unless the config says otherwise
const DEFAULT_NETMASK: &str = "255.255.255.0";

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "none") {
        memory_x();
    }
    network_config().unwrap();
}

/// Generate `network_config.rs` from `network_config.json`
fn network_config() -> io::Result<()> {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR environment variable not set");
    let dest_path = Path::new(&out_dir).join("network_config.rs");
    let mut f = File::create(dest_path).expect("Could not create network_config.rs file");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR environment variable not set");
    let config_path = Path::new(&manifest_dir).join("config/network_config.json");
    println!("cargo:rerun-if-changed={}", config_path.display());

    let config_contents = if config_path.exists() {
        fs::read_to_string(&config_path).expect("Could not read network_config.json file")
    } else {
        println!("cargo:warning=config/network_config.json not found, building with dummy credentials");
        DUMMY_CONFIG.to_string()
    };

    let config: serde_json::Value =
        serde_json::from_str(&config_contents).expect("Could not parse network_config.json file");
    let ssid = config["ssid"]
        .as_str()
        .expect("ssid not found in network_config.json file");
    let password = config["password"]
        .as_str()
        .expect("password not found in network_config.json file");
    let address = ipv4(&config, "address", DEFAULT_ADDRESS);
    let netmask = ipv4(&config, "netmask", DEFAULT_NETMASK);
    let gateway = config["gateway"].as_str().map_or_else(
        || "None".to_string(),
        |gw| {
            let octets = gw
                .parse::<Ipv4Addr>()
                .expect("gateway in network_config.json is not an IPv4 address")
                .octets();
            format!("Some({octets:?})")
        },
    );

    writeln!(
        f,
        "/// Station settings from `config/network_config.json`\n\
         pub const NETWORK: pico_alarm_buzzer::config::NetworkConfig = pico_alarm_buzzer::config::NetworkConfig {{\n\
         \x20   ssid: {ssid:?},\n\
         \x20   password: {password:?},\n\
         \x20   address: {address:?},\n\
         \x20   netmask: {netmask:?},\n\
         \x20   gateway: {gateway},\n\
         }};"
    )?;
    Ok(())
}

/// Read an optional dotted IPv4 field, falling back to `default`
fn ipv4(config: &serde_json::Value, key: &str, default: &str) -> [u8; 4] {
    config[key]
        .as_str()
        .unwrap_or(default)
        .parse::<Ipv4Addr>()
        .unwrap_or_else(|_| panic!("{key} in network_config.json is not an IPv4 address"))
        .octets()
}

/// Handle the `memory.x` linker script
fn memory_x() {
    // Put `memory.x` in our output directory and ensure it's
    // on the linker search path.
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();
    println!("cargo:rustc-link-search={}", out.display());

    // By default, Cargo will re-run a build script whenever
    // any file in the project changes. By specifying `memory.x`
    // here, we ensure the build script is only re-run when
    // `memory.x` is changed.
    println!("cargo:rerun-if-changed=memory.x");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
