use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::Parse, parse_macro_input, FnArg, GenericArgument, ItemImpl, LitStr, PathArguments,
    ReturnType, Token, Type,
};

/// Turns an `impl` block with a typed `call` method into a tool handler.
///
/// Apply this to an `impl` block that contains an async `call` method.
/// The macro will:
/// - Use the tool name and description given in the attribute
/// - Infer the input type from the second parameter of `call`
/// - Require the return type to be `Result<T, ToolError>` with `T: Serialize`
/// - Generate a `runcall::tools::ToolHandler` impl whose `definition()` carries the
///   JSON schema of the input type and whose `invoke()` decodes arguments, runs
///   `call` and encodes the output
///
/// # Example
/// ```ignore
/// #[tool(name = "allow_message", description = "Allow a message to be sent")]
/// impl AllowMessage {
///     async fn call(&self, input: Decision) -> Result<String, ToolError> {
///         // Implementation
///     }
/// }
///
/// #[derive(Deserialize, JsonSchema)]
/// struct Decision {
///     /// The message to allow
///     message: String,
/// }
/// ```
struct ToolArgs {
    name: LitStr,
    description: LitStr,
}

impl Parse for ToolArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut name = None;
        let mut description = None;

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;

            match key.to_string().as_str() {
                "name" => name = Some(value),
                "description" => description = Some(value),
                _ => {
                    return Err(syn::Error::new(
                        key.span(),
                        "expected 'name' or 'description'",
                    ))
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(ToolArgs {
            name: name.ok_or_else(|| input.error("missing 'name' attribute"))?,
            description: description
                .ok_or_else(|| input.error("missing 'description' attribute"))?,
        })
    }
}

#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ToolArgs);
    let impl_block = parse_macro_input!(item as ItemImpl);

    match expand(args, impl_block) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: ToolArgs, impl_block: ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    let self_ty = &impl_block.self_ty;
    let (impl_generics, _, where_clause) = impl_block.generics.split_for_impl();

    let call_method = impl_block
        .items
        .iter()
        .find_map(|item| match item {
            syn::ImplItem::Fn(method) if method.sig.ident == "call" => Some(method),
            _ => None,
        })
        .ok_or_else(|| {
            syn::Error::new_spanned(self_ty, "tool impl must contain an async fn call method")
        })?;

    if call_method.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &call_method.sig,
            "call method must be async",
        ));
    }

    let tool_name = args.name.value();
    let tool_description = args.description.value();

    // First parameter is &self.
    let input_type = call_method
        .sig
        .inputs
        .iter()
        .nth(1)
        .and_then(|arg| match arg {
            FnArg::Typed(pat_type) => Some(&*pat_type.ty),
            FnArg::Receiver(_) => None,
        })
        .ok_or_else(|| {
            syn::Error::new_spanned(&call_method.sig, "call method must have an input parameter")
        })?;

    match &call_method.sig.output {
        ReturnType::Type(_, ty) if extract_result_ok_type(ty).is_some() => {}
        output => {
            return Err(syn::Error::new_spanned(
                output,
                "call method must return Result<T, ToolError>",
            ))
        }
    }

    Ok(quote! {
        #impl_block

        #[::runcall::__private::async_trait]
        impl #impl_generics ::runcall::tools::ToolHandler for #self_ty #where_clause {
            fn name(&self) -> &str {
                #tool_name
            }

            fn definition(&self) -> ::runcall::tools::ToolDefinition {
                ::runcall::tools::ToolDefinition::new(
                    #tool_name,
                    #tool_description,
                    ::runcall::tools::schema_for::<#input_type>(),
                )
            }

            async fn invoke(
                &self,
                args: ::runcall::__private::serde_json::Value,
            ) -> ::std::result::Result<::runcall::__private::serde_json::Value, ::runcall::tools::ToolError> {
                let input: #input_type = ::runcall::__private::serde_json::from_value(args)
                    .map_err(|e| ::runcall::tools::ToolError::InvalidArguments {
                        tool: #tool_name.to_string(),
                        reason: e.to_string(),
                    })?;

                let output = self.call(input).await?;

                ::runcall::__private::serde_json::to_value(output)
                    .map_err(|e| ::runcall::tools::ToolError::Failed(e.to_string()))
            }
        }
    })
}

/// Extract the Ok type from Result<T, E>
fn extract_result_ok_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Result" {
            if let PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(GenericArgument::Type(ok_type)) = args.args.first() {
                    return Some(ok_type);
                }
            }
        }
    }
    None
}
