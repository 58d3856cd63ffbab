//! Configuration management for initrdgen.
//!
//! Reads configuration from a .env file and environment variables.
//! Environment variables take precedence over the .env file. All helper
//! binary locations live here rather than as process-wide constants, so a
//! deployment can point the builder at its own component payloads.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved paths for the guest-side component payloads and build output.
#[derive(Debug, Clone)]
pub struct Config {
    /// Static busybox binary staged into every image (default: components/busybox)
    pub busybox: PathBuf,
    /// Container-init helper script (default: components/container_init)
    pub container_init: PathBuf,
    /// Guest vsock bridge binary (default: components/vsock_bridge)
    pub vsock_bridge: PathBuf,
    /// Default-component directory holding pgms/ and qemu_init.sh
    /// (default: components/default)
    pub component_dir: PathBuf,
    /// Root directory for build outputs (default: build)
    pub build_root: PathBuf,
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// Relative paths are resolved against `base_dir`.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        // Try to load .env file
        let env_path = base_dir.join(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(&env_path) {
                for line in content.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((key, value)) = line.split_once('=') {
                        let key = key.trim();
                        let value = value.trim();
                        let value = value.trim_matches('"').trim_matches('\'');
                        env_vars.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let resolve = |key: &str, default: &str| -> PathBuf {
            let raw = env_vars
                .get(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default));
            if raw.is_absolute() {
                raw
            } else {
                base_dir.join(raw)
            }
        };

        Self {
            busybox: resolve("BUSYBOX", "components/busybox"),
            container_init: resolve("CONTAINER_INIT", "components/container_init"),
            vsock_bridge: resolve("VSOCK_BRIDGE", "components/vsock_bridge"),
            component_dir: resolve("COMPONENT_DIR", "components/default"),
            build_root: resolve("BUILD_ROOT", "build"),
        }
    }

    /// Path to the pgms/ auxiliary directory inside the component dir.
    pub fn pgms_dir(&self) -> PathBuf {
        self.component_dir.join("pgms")
    }

    /// Path to the qemu_init.sh helper inside the component dir.
    pub fn qemu_init(&self) -> PathBuf {
        self.component_dir.join("qemu_init.sh")
    }

    /// Print configuration for `show config`.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  BUSYBOX: {}", self.busybox.display());
        println!("  CONTAINER_INIT: {}", self.container_init.display());
        println!("  VSOCK_BRIDGE: {}", self.vsock_bridge.display());
        println!("  COMPONENT_DIR: {}", self.component_dir.display());
        println!("  BUILD_ROOT: {}", self.build_root.display());
    }
}
