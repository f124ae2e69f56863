use proc_macro::TokenStream;
use proc_macro2::Span;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned;
use syn::{
    Attribute, FnArg, ImplItem, ImplItemMethod, ItemImpl, Meta, NestedMeta, Pat, Visibility,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Init,
    Call,
    View,
}

struct MethodAttrs {
    kind: Option<Kind>,
    private: bool,
    payable: bool,
}

const KIND_ATTRS: [(&str, Kind); 3] = [
    ("init", Kind::Init),
    ("call", Kind::Call),
    ("view", Kind::View),
];

fn kind_of(attr: &Attribute) -> Option<Kind> {
    KIND_ATTRS
        .iter()
        .find(|(name, _)| attr.path.is_ident(name))
        .map(|(_, kind)| *kind)
}

/// Collects `#[init]`, `#[call(..)]` and `#[view]` from the method and removes them,
/// so the emitted `impl` block carries no unknown attributes.
fn take_method_attrs(method: &mut ImplItemMethod) -> syn::Result<MethodAttrs> {
    let mut attrs = MethodAttrs {
        kind: None,
        private: false,
        payable: false,
    };
    let mut kept = Vec::with_capacity(method.attrs.len());
    for attr in method.attrs.drain(..) {
        let kind = match kind_of(&attr) {
            Some(kind) => kind,
            None => {
                kept.push(attr);
                continue;
            }
        };
        if attrs.kind.is_some() {
            return Err(syn::Error::new_spanned(
                &attr,
                "a method can only have one of #[init], #[call] or #[view]",
            ));
        }
        attrs.kind = Some(kind);

        match attr.parse_meta()? {
            Meta::Path(_) => {}
            Meta::List(list) => {
                for nested in list.nested {
                    match nested {
                        NestedMeta::Meta(Meta::Path(path)) if path.is_ident("payable") => {
                            attrs.payable = true
                        }
                        NestedMeta::Meta(Meta::Path(path)) if path.is_ident("private") => {
                            attrs.private = true
                        }
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "expected `payable` or `private`",
                            ))
                        }
                    }
                }
            }
            meta @ Meta::NameValue(_) => {
                return Err(syn::Error::new_spanned(meta, "unexpected attribute value"))
            }
        }
    }
    method.attrs = kept;
    Ok(attrs)
}

/// Resolves the method kind: an explicit attribute wins, otherwise the receiver decides.
fn resolve_kind(method: &ImplItemMethod, explicit: Option<Kind>) -> syn::Result<Kind> {
    let receiver = method.sig.inputs.iter().find_map(|arg| match arg {
        FnArg::Receiver(receiver) => Some(receiver),
        FnArg::Typed(_) => None,
    });
    match (receiver, explicit) {
        (Some(receiver), _) if receiver.reference.is_none() => Err(syn::Error::new_spanned(
            receiver,
            "contract methods take `&self` or `&mut self`",
        )),
        (Some(receiver), Some(Kind::Init)) => Err(syn::Error::new_spanned(
            receiver,
            "#[init] methods construct the state and cannot take `self`",
        )),
        (Some(receiver), Some(Kind::View)) if receiver.mutability.is_some() => {
            Err(syn::Error::new_spanned(
                receiver,
                "#[view] methods cannot change the state and take `&self`",
            ))
        }
        (Some(_), Some(kind)) => Ok(kind),
        (Some(receiver), None) if receiver.mutability.is_some() => Ok(Kind::Call),
        (Some(_), None) => Ok(Kind::View),
        (None, Some(Kind::Init)) => Ok(Kind::Init),
        (None, _) => Err(syn::Error::new_spanned(
            &method.sig,
            "public methods without `self` must be marked #[init]",
        )),
    }
}

/// Builds the `Input` struct the JSON arguments are read into, and the list of its fields.
fn input_struct_deser(method: &ImplItemMethod) -> syn::Result<(TokenStream2, TokenStream2)> {
    let mut fields = TokenStream2::new();
    let mut arg_list = TokenStream2::new();
    for arg in &method.sig.inputs {
        let typed = match arg {
            FnArg::Receiver(_) => continue,
            FnArg::Typed(typed) => typed,
        };
        let ident = match typed.pat.as_ref() {
            Pat::Ident(pat) => &pat.ident,
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "contract method arguments must be plain identifiers",
                ))
            }
        };
        let ty = &typed.ty;
        fields.extend(quote! {
            #ident: #ty,
        });
        arg_list.extend(quote! {
            #ident,
        });
    }
    let input_struct = quote! {
        #[derive(serde::Deserialize)]
        struct Input {
            #fields
        }
    };
    Ok((input_struct, arg_list))
}

fn method_wrapper(
    struct_type: &syn::Type,
    method: &ImplItemMethod,
    attrs: &MethodAttrs,
) -> syn::Result<TokenStream2> {
    let ident = &method.sig.ident;
    let kind = resolve_kind(method, attrs.kind)?;
    let (input_struct, arg_list) = input_struct_deser(method)?;

    let mut options = match kind {
        Kind::Init => quote! { trie_sdk::dispatch::MethodOptions::init() },
        Kind::Call => quote! { trie_sdk::dispatch::MethodOptions::call() },
        Kind::View => quote! { trie_sdk::dispatch::MethodOptions::view() },
    };
    if attrs.private {
        options.extend(quote! { .private() });
    }
    if attrs.payable {
        options.extend(quote! { .payable() });
    }

    let dispatch = match kind {
        Kind::Init => quote! {
            trie_sdk::dispatch::init(#options, |Input { #arg_list }: Input| {
                <#struct_type>::#ident(#arg_list)
            });
        },
        Kind::Call => quote! {
            trie_sdk::dispatch::call(#options, |state: &mut #struct_type, Input { #arg_list }: Input| {
                <#struct_type>::#ident(state, #arg_list)
            });
        },
        Kind::View => quote! {
            trie_sdk::dispatch::view(#options, |state: &#struct_type, Input { #arg_list }: Input| {
                <#struct_type>::#ident(state, #arg_list)
            });
        },
    };

    Ok(quote! {
        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn #ident() {
            #input_struct
            #dispatch
        }
    })
}

/// Walks over public methods and generates an exported entry point for each method it finds.
///
/// The entry point runs the method through [`trie_sdk::dispatch`]: it reads the JSON arguments from
/// `trie_sdk::input`, loads the contract state, calls the method and writes the JSON result with
/// `trie_sdk::output`. The kind of a method is taken from `#[init]`, `#[call]` or `#[view]`, or
/// otherwise from its receiver: `&mut self` is a call and `&self` is a view. `#[call(payable)]`
/// accepts an attached deposit and `#[call(private)]` can only be called by the contract itself.
///
/// # Example
/// ```
/// use trie_sdk_macros::contract;
///
/// struct Contract {
///     greeting: String,
/// }
///
/// #[contract]
/// impl Contract {
///     #[init]
///     pub fn new(greeting: String) -> Self {
///         Self { greeting }
///     }
///
///     pub fn greet(&self, name: String) -> String {
///         format!("{}, {}", self.greeting, name)
///     }
///
///     #[call(private)]
///     pub fn set_greeting(&mut self, greeting: String) {
///         self.greeting = greeting;
///     }
/// }
/// ```
///
/// Views only borrow the state, so a `#[view]` taking `&mut self` is rejected:
/// ```compile_fail
/// use trie_sdk_macros::contract;
///
/// struct Contract {
///     greeting: String,
/// }
///
/// #[contract]
/// impl Contract {
///     #[view]
///     pub fn greet(&mut self) -> String {
///         self.greeting.clone()
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn contract(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = match syn::parse::<ItemImpl>(item) {
        Ok(input) => input,
        Err(_) => {
            return TokenStream::from(
                syn::Error::new(
                    Span::call_site(),
                    "#[contract] can only be used on impl sections.",
                )
                .to_compile_error(),
            )
        }
    };

    let struct_type = input.self_ty.clone();
    let mut generated_code = TokenStream2::new();
    for item in &mut input.items {
        let method = match item {
            ImplItem::Method(method) => method,
            other => {
                return TokenStream::from(
                    syn::Error::new_spanned(other, "#[contract] only supports methods for now.")
                        .to_compile_error(),
                )
            }
        };
        let attrs = match take_method_attrs(method) {
            Ok(attrs) => attrs,
            Err(err) => {
                generated_code.extend(err.to_compile_error());
                continue;
            }
        };
        if !matches!(method.vis, Visibility::Public(_)) {
            continue;
        }
        match method_wrapper(&struct_type, method, &attrs) {
            Ok(wrapper) => generated_code.extend(wrapper),
            Err(err) => generated_code.extend(err.to_compile_error()),
        }
    }

    TokenStream::from(quote! {
        #input
        #generated_code
    })
}

//====================================================== TESTS =================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(method: &str) -> ImplItemMethod {
        syn::parse_str(method).unwrap()
    }

    fn kind_of_method(method: &str) -> syn::Result<Kind> {
        let mut method = parse(method);
        let attrs = take_method_attrs(&mut method)?;
        resolve_kind(&method, attrs.kind)
    }

    #[test]
    fn test_kind_from_receiver() {
        assert_eq!(kind_of_method("pub fn f(&mut self) {}").unwrap(), Kind::Call);
        assert_eq!(kind_of_method("pub fn f(&self) -> u32 { 0 }").unwrap(), Kind::View);
        assert_eq!(kind_of_method("#[init] pub fn f() -> Self { Self }").unwrap(), Kind::Init);
    }

    #[test]
    fn test_explicit_kind() {
        assert_eq!(kind_of_method("#[call] pub fn f(&self) {}").unwrap(), Kind::Call);
        assert_eq!(kind_of_method("#[view] pub fn f(&self) {}").unwrap(), Kind::View);
    }

    #[test]
    fn test_view_with_mut_receiver() {
        let err = kind_of_method("#[view] pub fn f(&mut self) {}").unwrap_err();
        assert!(err.to_string().contains("#[view] methods cannot change the state"));
    }

    #[test]
    fn test_rejected_receivers() {
        assert!(kind_of_method("pub fn f(self) {}").is_err());
        assert!(kind_of_method("#[init] pub fn f(&mut self) {}").is_err());
        assert!(kind_of_method("pub fn f() {}").is_err());
    }

    #[test]
    fn test_method_options() {
        let mut method = parse("#[call(payable, private)] #[inline] pub fn f(&mut self) {}");
        let attrs = take_method_attrs(&mut method).unwrap();

        assert!(attrs.payable);
        assert!(attrs.private);
        assert_eq!(method.attrs.len(), 1);
        assert!(method.attrs[0].path.is_ident("inline"));

        let mut method = parse("#[call(free)] pub fn f(&mut self) {}");
        assert!(take_method_attrs(&mut method).is_err());
    }
}
