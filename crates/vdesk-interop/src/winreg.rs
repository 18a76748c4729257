//! Minimal registry access for build and IID discovery

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{ERROR_NO_MORE_ITEMS, ERROR_SUCCESS};
use windows::Win32::System::Registry::{
    RegCloseKey, RegEnumKeyExW, RegGetValueW, RegOpenKeyExW, HKEY, KEY_READ, RRF_RT_REG_SZ,
};

pub use windows::Win32::System::Registry::{HKEY_CLASSES_ROOT, HKEY_LOCAL_MACHINE};

// Helper function to convert a string to a null-terminated wide string
fn to_wide_string(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

fn from_wide(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}

/// Read a REG_SZ value; an empty `value` reads the key's default value
pub fn read_string(root: HKEY, subkey: &str, value: &str) -> Result<String, String> {
    let subkey_wide = to_wide_string(subkey);
    let value_wide = to_wide_string(value);
    let value_ptr = if value.is_empty() {
        PCWSTR::null()
    } else {
        PCWSTR(value_wide.as_ptr())
    };

    let mut size: u32 = 0;
    let status = unsafe {
        RegGetValueW(
            root,
            PCWSTR(subkey_wide.as_ptr()),
            value_ptr,
            RRF_RT_REG_SZ,
            None,
            None,
            Some(&mut size as *mut u32),
        )
    };
    if status != ERROR_SUCCESS {
        return Err(format!("{}\\{}: error {}", subkey, value, status.0));
    }

    let mut buf = vec![0u16; (size as usize).div_ceil(2)];
    let status = unsafe {
        RegGetValueW(
            root,
            PCWSTR(subkey_wide.as_ptr()),
            value_ptr,
            RRF_RT_REG_SZ,
            None,
            Some(buf.as_mut_ptr().cast()),
            Some(&mut size as *mut u32),
        )
    };
    if status != ERROR_SUCCESS {
        return Err(format!("{}\\{}: error {}", subkey, value, status.0));
    }

    Ok(from_wide(&buf))
}

/// Names of every direct subkey of `root\subkey`
pub fn subkeys(root: HKEY, subkey: &str) -> Result<Vec<String>, String> {
    let subkey_wide = to_wide_string(subkey);
    let mut key = HKEY::default();
    let status = unsafe { RegOpenKeyExW(root, PCWSTR(subkey_wide.as_ptr()), 0, KEY_READ, &mut key) };
    if status != ERROR_SUCCESS {
        return Err(format!("{}: error {}", subkey, status.0));
    }

    let mut names = Vec::new();
    let mut name_buf = [0u16; 256];
    let mut index = 0;
    loop {
        let mut len = name_buf.len() as u32;
        let status = unsafe {
            RegEnumKeyExW(
                key,
                index,
                PWSTR(name_buf.as_mut_ptr()),
                &mut len,
                None,
                PWSTR::null(),
                None,
                None,
            )
        };
        if status == ERROR_NO_MORE_ITEMS {
            break;
        }
        if status == ERROR_SUCCESS {
            names.push(from_wide(&name_buf[..len as usize]));
        }
        index += 1;
    }

    unsafe {
        let _ = RegCloseKey(key);
    }
    Ok(names)
}
