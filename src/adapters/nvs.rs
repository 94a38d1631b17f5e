//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`CounterStore`] and [`ConfigPort`].
//!
//! - The refill count is a plain `u32` entry under [`NAMESPACE`].
//! - Configuration is a postcard blob under the same namespace with key
//!   `"syscfg"`; a missing or unreadable blob falls back to defaults.
//! - Every write is committed before returning (write-through).
//!
//! On ESP-IDF the adapter expects the default NVS partition to be
//! initialised already (the WiFi driver takes it first in `main`).  The
//! simulation backend keeps everything in a `HashMap`.

use crate::app::ports::{ConfigError, ConfigPort, CounterStore, StorageError};
use crate::config::SystemConfig;
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;
#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

/// Firmware namespace shared by the counter and the config blob.
pub const NAMESPACE: &str = "rocket";
const CONFIG_KEY: &str = "syscfg";

#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 512;

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone)]
enum SimEntry {
    U32(u32),
    Blob(Vec<u8>),
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: RefCell<HashMap<String, SimEntry>>,
    /// Simulation only: make every access fail with `IoError`.
    #[cfg(not(target_os = "espidf"))]
    fail: bool,
}

impl NvsAdapter {
    pub fn new() -> Self {
        #[cfg(not(target_os = "espidf"))]
        info!("NVS | simulation backend");

        #[cfg(target_os = "espidf")]
        info!("NVS | namespace={NAMESPACE}");

        Self {
            #[cfg(not(target_os = "espidf"))]
            store: RefCell::new(HashMap::new()),
            #[cfg(not(target_os = "espidf"))]
            fail: false,
        }
    }

    /// Simulate an unavailable storage partition.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_failing(&mut self, fail: bool) {
        self.fail = fail;
    }

    #[cfg(not(target_os = "espidf"))]
    fn check(&self) -> Result<(), StorageError> {
        if self.fail {
            Err(StorageError::IoError)
        } else {
            Ok(())
        }
    }

    /// NUL-terminated copy of a key or namespace (NVS caps both at 15 bytes).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(NAMESPACE);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: `handle` was opened above and is not used afterwards.
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ── CounterStore ──────────────────────────────────────────────

impl CounterStore for NvsAdapter {
    fn get_u32(&self, key: &str, default: u32) -> Result<u32, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.check()?;
            match self.store.borrow().get(key) {
                Some(SimEntry::U32(v)) => Ok(*v),
                Some(SimEntry::Blob(_)) => Err(StorageError::IoError),
                None => Ok(default),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let k = Self::c_name(key);
            let result = Self::with_nvs_handle(false, |handle| {
                let mut value: u32 = 0;
                // SAFETY: `k` is NUL-terminated, `value` is a valid out pointer.
                let ret = unsafe { nvs_get_u32(handle, k.as_ptr() as *const _, &mut value) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(value)
            });
            match result {
                Ok(v) => Ok(v),
                // A namespace that was never written cannot be opened read-only.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(default),
                Err(e) => {
                    log::warn!("NVS | read {key} failed ({e})");
                    Err(StorageError::IoError)
                }
            }
        }
    }

    fn put_u32(&mut self, key: &str, value: u32) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.check()?;
            self.store
                .borrow_mut()
                .insert(key.to_owned(), SimEntry::U32(value));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let k = Self::c_name(key);
            let result = Self::with_nvs_handle(true, |handle| {
                // SAFETY: `k` is NUL-terminated; `handle` is open read-write.
                let ret = unsafe { nvs_set_u32(handle, k.as_ptr() as *const _, value) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                log::warn!("NVS | write {key} failed ({e})");
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }
}

// ── ConfigPort ────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.check().map_err(|_| ConfigError::IoError)?;
            match self.store.borrow().get(CONFIG_KEY) {
                Some(SimEntry::Blob(bytes)) => {
                    let cfg: SystemConfig =
                        postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NVS | loaded config from store");
                    Ok(cfg)
                }
                Some(SimEntry::U32(_)) => Err(ConfigError::Corrupted),
                None => {
                    info!("NVS | no stored config, using defaults");
                    Ok(SystemConfig::default())
                }
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let k = Self::c_name(CONFIG_KEY);
            let result = Self::with_nvs_handle(false, |handle| {
                let mut size: usize = 0;
                // First call: get size
                // SAFETY: a null buffer asks NVS for the blob length only.
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        k.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH);
                }

                let mut buf = vec![0u8; size];
                // SAFETY: `buf` holds exactly `size` bytes.
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        k.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: SystemConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NVS | loaded config ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("NVS | no stored config, using defaults");
                    Ok(SystemConfig::default())
                }
                Err(e) => {
                    log::warn!("NVS | config read error {e}, using defaults");
                    Ok(SystemConfig::default())
                }
            }
        }
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.check().map_err(|_| ConfigError::IoError)?;
            self.store
                .borrow_mut()
                .insert(CONFIG_KEY.to_owned(), SimEntry::Blob(bytes));
            info!("NVS | config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let k = Self::c_name(CONFIG_KEY);
            let result = Self::with_nvs_handle(true, |handle| {
                // SAFETY: `bytes` outlives the call; `handle` is open read-write.
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        k.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NVS | config saved ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    log::warn!("NVS | config write error {e}");
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}
