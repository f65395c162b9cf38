//! Template expansion
//!
//! Bodies are Handlebars templates rendered in strict mode with escaping
//! turned off. The only domain helper is `ref`, which splices in the text
//! returned by an injected [`Resolve`] implementation:
//!
//! ```text
//! {{ref "skills/refund_policy"}}
//! ```
//!
//! The expander keeps no state between calls. Cycle detection lives in the
//! resolver.

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError, RenderErrorReason,
};
use log::debug;
use serde_json::Value;
use std::sync::Mutex;

use super::error::CompileError;

/// Name of the reference helper inside templates
pub const REF_HELPER: &str = "ref";

/// Something that can turn a reference into expanded text
pub trait Resolve: Sync {
    fn resolve(&self, reference: &str) -> Result<String, CompileError>;
}

/// Expands one template body against a resolver and a variable context
pub struct Expander<'a> {
    resolver: &'a dyn Resolve,
    context: &'a Value,
}

impl<'a> Expander<'a> {
    pub fn new(resolver: &'a dyn Resolve, context: &'a Value) -> Self {
        Self { resolver, context }
    }

    /// Render `body`, resolving every `ref` call through the resolver
    pub fn expand(&self, body: &str) -> Result<String, CompileError> {
        let failure: Mutex<Option<CompileError>> = Mutex::new(None);

        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.register_helper(
            REF_HELPER,
            Box::new(RefHelper {
                resolver: self.resolver,
                failure: &failure,
            }),
        );

        debug!("Expander::expand: rendering {} bytes", body.len());
        let rendered = hbs.render_template(body, self.context);
        drop(hbs);

        match rendered {
            Ok(text) => Ok(text),
            Err(err) => {
                let captured = failure.into_inner().ok().flatten();
                Err(captured.unwrap_or_else(|| classify(&err)))
            }
        }
    }
}

/// Map a render error that did not originate in the resolver
fn classify(err: &RenderError) -> CompileError {
    match err.reason() {
        RenderErrorReason::MissingVariable(path) => CompileError::UndefinedReference {
            detail: match path {
                Some(p) => format!("variable '{}' is not defined", p),
                None => err.to_string(),
            },
        },
        RenderErrorReason::HelperNotFound(name) => CompileError::UndefinedReference {
            detail: format!("helper '{}' is not defined", name),
        },
        _ => CompileError::Template {
            detail: err.to_string(),
        },
    }
}

struct RefHelper<'a> {
    resolver: &'a dyn Resolve,
    failure: &'a Mutex<Option<CompileError>>,
}

impl HelperDef for RefHelper<'_> {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let reference = h
            .param(0)
            .and_then(|p| p.value().as_str())
            .ok_or(RenderErrorReason::InvalidParamType("ref expects a single string path"))?;

        match self.resolver.resolve(reference) {
            Ok(text) => {
                out.write(&text)?;
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                if let Ok(mut slot) = self.failure.lock() {
                    slot.get_or_insert(e);
                }
                Err(RenderErrorReason::Other(message).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct MapResolver(HashMap<&'static str, &'static str>);

    impl Resolve for MapResolver {
        fn resolve(&self, reference: &str) -> Result<String, CompileError> {
            self.0
                .get(reference)
                .map(|s| s.to_string())
                .ok_or_else(|| CompileError::ReferenceNotFound {
                    reference: reference.to_string(),
                })
        }
    }

    fn resolver() -> MapResolver {
        MapResolver(HashMap::from([
            ("macros/greeting", "Hello & welcome"),
            ("skills/refunds", "Refunds within 30 days."),
        ]))
    }

    #[test]
    fn test_expand_plain_text() {
        let r = resolver();
        let ctx = json!({});
        let out = Expander::new(&r, &ctx).expand("no templates here").unwrap();
        assert_eq!(out, "no templates here");
    }

    #[test]
    fn test_ref_spliced_without_escaping() {
        let r = resolver();
        let ctx = json!({});
        let out = Expander::new(&r, &ctx)
            .expand("A: {{ ref \"macros/greeting\" }}\nB: {{ref \"skills/refunds\"}}")
            .unwrap();
        assert_eq!(out, "A: Hello & welcome\nB: Refunds within 30 days.");
    }

    #[test]
    fn test_variables_interpolated() {
        let r = resolver();
        let ctx = json!({"name": "support_agent", "temperature": 0.2});
        let out = Expander::new(&r, &ctx).expand("I am {{name}} at {{temperature}}").unwrap();
        assert_eq!(out, "I am support_agent at 0.2");
    }

    #[test]
    fn test_undefined_variable_fails() {
        let r = resolver();
        let ctx = json!({});
        let err = Expander::new(&r, &ctx).expand("{{ undeclared_var }}").unwrap_err();
        match err {
            CompileError::UndefinedReference { detail } => assert!(detail.contains("undeclared_var")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_helper_fails() {
        let r = resolver();
        let ctx = json!({});
        let err = Expander::new(&r, &ctx).expand("{{include \"macros/greeting\"}}").unwrap_err();
        assert!(matches!(err, CompileError::UndefinedReference { .. }));
    }

    #[test]
    fn test_resolver_error_is_preserved() {
        let r = resolver();
        let ctx = json!({});
        let err = Expander::new(&r, &ctx).expand("{{ref \"macros/missing\"}}").unwrap_err();
        match err {
            CompileError::ReferenceNotFound { reference } => assert_eq!(reference, "macros/missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ref_without_string_param() {
        let r = resolver();
        let ctx = json!({"n": 3});
        let err = Expander::new(&r, &ctx).expand("{{ref n}}").unwrap_err();
        assert!(matches!(err, CompileError::Template { .. }));
    }

    #[test]
    fn test_malformed_template() {
        let r = resolver();
        let ctx = json!({});
        let err = Expander::new(&r, &ctx).expand("{{#if}}unclosed").unwrap_err();
        assert!(matches!(err, CompileError::Template { .. }));
    }
}
