//! Per-interface vtable generation

use crate::ast::Type;
use crate::semantic::{CompiledInterface, CompiledMethod};
use proc_macro2::{Literal, Span, TokenStream};
use quote::{format_ident, quote};

/// Words that cannot be used as parameter names in the generated code
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "fn", "for", "if", "impl", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "type", "unsafe", "use",
    "where", "while", "yield",
];

/// IID constant, vtable struct and slot constants for one interface
pub fn generate_interface(iface: &CompiledInterface) -> TokenStream {
    let vtbl = format_ident!("{}_Vtbl", iface.name);
    let base_vtbl = format_ident!("{}_Vtbl", iface.base);
    let iid_const = format_ident!("IID_{}", iface.name.to_uppercase());
    let iid_value = syn::LitInt::new(&format!("0x{:032x}u128", iface.iid.to_u128()), Span::call_site());
    let slot_mod = format_ident!("{}_slot", iface.name.to_lowercase());
    let iid_doc = format!("{{{}}}", iface.iid);

    let fields: Vec<_> = iface.methods.iter().map(generate_field).collect();

    let slots: Vec<_> = iface
        .methods
        .iter()
        .map(|m| {
            let name = format_ident!("{}", m.name.to_uppercase());
            let slot = Literal::usize_unsuffixed(m.slot as usize);
            quote! { pub const #name: usize = #slot; }
        })
        .collect();

    quote! {
        #[doc = #iid_doc]
        pub const #iid_const: GUID = GUID::from_u128(#iid_value);

        #[repr(C)]
        pub struct #vtbl {
            pub base__: #base_vtbl,
            #(#fields,)*
        }

        pub mod #slot_mod {
            #(#slots)*
        }
    }
}

fn generate_field(method: &CompiledMethod) -> TokenStream {
    let name = format_ident!("{}", method.name);
    let params: Vec<_> = method
        .params
        .iter()
        .map(|p| {
            let pname = param_ident(&p.name);
            let ty = type_to_rust(&p.ty);
            quote! { #pname: #ty }
        })
        .collect();

    if method.return_type.is_void() {
        quote! {
            pub #name: unsafe extern "system" fn(this: *mut c_void #(, #params)*)
        }
    } else {
        let ret = type_to_rust(&method.return_type);
        quote! {
            pub #name: unsafe extern "system" fn(this: *mut c_void #(, #params)*) -> #ret
        }
    }
}

fn param_ident(name: &str) -> proc_macro2::Ident {
    if RUST_KEYWORDS.contains(&name) || name == "this" {
        format_ident!("{}_", name)
    } else {
        format_ident!("{}", name)
    }
}

/// Map an IDL type onto its ABI-compatible Rust spelling
fn type_to_rust(ty: &Type) -> TokenStream {
    let mut tokens = match ty.name.as_str() {
        "HRESULT" => quote! { HRESULT },
        "BOOL" | "INT" | "LONG" => quote! { i32 },
        "UINT" | "ULONG" | "DWORD" => quote! { u32 },
        "HWND" | "HMONITOR" => quote! { isize },
        "HSTRING" => quote! { *mut c_void },
        "GUID" => quote! { GUID },
        "REFIID" => quote! { *const GUID },
        // void and every interface type are opaque behind a pointer
        _ => quote! { c_void },
    };

    for depth in 0..ty.pointer_depth {
        let outermost = depth + 1 == ty.pointer_depth;
        tokens = if outermost && ty.is_const {
            quote! { *const #tokens }
        } else {
            quote! { *mut #tokens }
        };
    }

    tokens
}
