//! Policy model definitions.
//!
//! The built-in model is role-based: a request `(sub, obj, act)` is
//! allowed when the subject (directly or via the `g` role graph) holds a
//! policy whose object pattern key-matches the request path and whose
//! action pattern regex-matches the method. Services can override it with
//! a model file via `security.access_control.model_path`.

use casbin::DefaultModel;

use crate::error::AuthzResult;

/// The built-in RBAC model.
pub const DEFAULT_MODEL: &str = r"[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && keyMatch2(r.obj, p.obj) && regexMatch(r.act, p.act)
";

/// Names of the rule collection fields, in storage order.
pub const RULE_FIELDS: [&str; 6] = ["v0", "v1", "v2", "v3", "v4", "v5"];

/// Loads the policy model from a file, or the built-in model when no path
/// is configured.
///
/// # Errors
///
/// Returns `AuthzError::Policy` if the model cannot be parsed.
pub async fn load_model(model_path: Option<&str>) -> AuthzResult<DefaultModel> {
    let model = match model_path {
        Some(path) => DefaultModel::from_file(path).await?,
        None => DefaultModel::from_str(DEFAULT_MODEL).await?,
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_model_parses() {
        assert!(load_model(None).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_model_file_errors() {
        assert!(load_model(Some("/nonexistent/model.conf")).await.is_err());
    }
}
