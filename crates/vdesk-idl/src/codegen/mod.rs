//! Code Generation
//!
//! Generates Rust vtable definitions from a compiled module. Output is meant
//! to be written at build time and compiled into the consumer, one file per
//! interface version.

mod vtable;

use crate::error::{IdlError, Result};
use crate::semantic::CompiledModule;
use proc_macro2::{Literal, TokenStream};
use quote::quote;

/// Generate Rust source for every interface of `module`
pub fn generate(module: &CompiledModule) -> Result<String> {
    let mut tokens = TokenStream::new();

    tokens.extend(generate_prelude(module));

    for iface in &module.interfaces {
        tokens.extend(vtable::generate_interface(iface));
    }

    let file: syn::File = syn::parse2(tokens)
        .map_err(|e| IdlError::codegen(format!("failed to parse generated code: {}", e)))?;
    Ok(prettyplease::unparse(&file))
}

/// Shared ABI types plus the descriptor values baked into the module
fn generate_prelude(module: &CompiledModule) -> TokenStream {
    let d = &module.descriptor;
    let os_build = Literal::u32_unsuffixed(d.os_build);
    let interface_version = Literal::u32_unsuffixed(d.interface_version);
    let major = Literal::u16_unsuffixed(d.version.0);
    let minor = Literal::u16_unsuffixed(d.version.1);

    quote! {
        #![allow(non_snake_case, non_camel_case_types, dead_code)]

        use std::ffi::c_void;

        pub const OS_BUILD: u32 = #os_build;
        pub const INTERFACE_VERSION: u32 = #interface_version;
        pub const MODULE_VERSION: (u16, u16) = (#major, #minor);

        pub type HRESULT = i32;

        #[repr(C)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct GUID {
            pub data1: u32,
            pub data2: u16,
            pub data3: u16,
            pub data4: [u8; 8],
        }

        impl GUID {
            pub const fn from_u128(value: u128) -> Self {
                Self {
                    data1: (value >> 96) as u32,
                    data2: (value >> 80) as u16,
                    data3: (value >> 64) as u16,
                    data4: (value as u64).to_be_bytes(),
                }
            }
        }

        #[repr(C)]
        pub struct IUnknown_Vtbl {
            pub QueryInterface: unsafe extern "system" fn(this: *mut c_void, iid: *const GUID, object: *mut *mut c_void) -> HRESULT,
            pub AddRef: unsafe extern "system" fn(this: *mut c_void) -> u32,
            pub Release: unsafe extern "system" fn(this: *mut c_void) -> u32,
        }

        #[repr(C)]
        pub struct IInspectable_Vtbl {
            pub base__: IUnknown_Vtbl,
            pub GetIids: unsafe extern "system" fn(this: *mut c_void, count: *mut u32, iids: *mut *mut GUID) -> HRESULT,
            pub GetRuntimeClassName: unsafe extern "system" fn(this: *mut c_void, name: *mut *mut c_void) -> HRESULT,
            pub GetTrustLevel: unsafe extern "system" fn(this: *mut c_void, level: *mut i32) -> HRESULT,
        }
    }
}
