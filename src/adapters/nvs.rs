//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the Bindicator.
//!
//! - Config validation: every field is range-checked before persistence.
//! - Namespaces: the status record and the config blob share the
//!   `bindicator` namespace under distinct keys.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//!
//! On host builds the partition is simulated by an in-memory map.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::BindicatorConfig;
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::warn;

const CONFIG_NAMESPACE: &str = "bindicator";
const CONFIG_KEY: &str = "config";

/// NVS names are limited to 15 bytes plus the terminator.
const NVS_NAME_LEN: usize = 16;

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 1024;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

/// NUL-terminated NVS name, truncated to the NVS limit.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn nvs_name(name: &str) -> [u8; NVS_NAME_LEN] {
    let mut buf = [0u8; NVS_NAME_LEN];
    let len = name.len().min(NVS_NAME_LEN - 1);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);
    buf
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably.  A partition without free pages or written by a newer
    /// IDF version is erased and re-initialised.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Open an NVS namespace, run `f` with the handle, then close it.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = nvs_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(namespace: &str, key: &str) -> Result<Vec<u8>, i32> {
        Self::with_nvs_handle(namespace, false, |handle| {
            let name = nvs_name(key);
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(handle, name.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(handle, name.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        })
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(namespace: &str, key: &str, data: &[u8]) -> Result<(), i32> {
        Self::with_nvs_handle(namespace, true, |handle| {
            let name = nvs_name(key);
            let ret = unsafe {
                nvs_set_blob(handle, name.as_ptr() as *const _, data.as_ptr() as *const _, data.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
    }
}

impl Default for NvsAdapter {
    /// Degraded adapter for when flash init failed: every access reports
    /// an error on device, so the status lives in memory only.
    fn default() -> Self {
        Self::new().unwrap_or(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }
}

fn validate_config(cfg: &BindicatorConfig) -> Result<(), ConfigError> {
    if cfg.reset_hour > 23 {
        return Err(ConfigError::ValidationFailed("reset_hour must be 0–23"));
    }
    if !(10_000..=3_600_000).contains(&cfg.error_retry_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "error_retry_interval_ms must be 10000–3600000",
        ));
    }
    if !(60_000..=86_400_000).contains(&cfg.calendar_check_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "calendar_check_interval_ms must be 60000–86400000",
        ));
    }
    if !(500..=10_000).contains(&cfg.long_press_ms) {
        return Err(ConfigError::ValidationFailed(
            "long_press_ms must be 500–10000",
        ));
    }
    if cfg.timezone.parse::<chrono_tz::Tz>().is_err() {
        return Err(ConfigError::ValidationFailed(
            "timezone must be an IANA zone name",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<BindicatorConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            if let Some(bytes) = self.store.borrow().get(&key) {
                let cfg: BindicatorConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(BindicatorConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            match Self::read_blob(CONFIG_NAMESPACE, CONFIG_KEY) {
                Ok(bytes) => {
                    let cfg: BindicatorConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("NvsAdapter: no stored config, using defaults");
                    Ok(BindicatorConfig::default())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    Ok(BindicatorConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &BindicatorConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            match Self::write_blob(CONFIG_NAMESPACE, CONFIG_KEY, &bytes) {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE => Err(ConfigError::StorageFull),
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let name = nvs_name(key);
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(handle, name.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                // A never-written namespace cannot be opened read-only.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(StorageError::Encoding),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::write_blob(namespace, key, data).map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let name = nvs_name(key);
                let ret = unsafe { nvs_erase_key(handle, name.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let name = nvs_name(key);
                let ret = unsafe {
                    nvs_find_key(handle, name.as_ptr() as *const _, core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }
}
