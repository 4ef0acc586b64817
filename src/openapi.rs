use crate::error::ApiErrorBody;
use crate::models::{
    AccountUpdate, AccountView, Challenge, ChallengeUpdate, Company, CompanyUpdate, LoginRequest,
    LoginResponse, NewChallenge, NewCompany, SignupRequest, SignupResponse,
};
use crate::routes::Home;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::home,
        crate::routes::signup,
        crate::routes::login,
        crate::routes::me,
        crate::routes::list_users,
        crate::routes::get_user,
        crate::routes::update_user,
        crate::routes::list_challenges,
        crate::routes::create_challenge,
        crate::routes::get_challenge,
        crate::routes::create_company,
        crate::routes::update_company,
    ),
    components(schemas(
        Home, ApiErrorBody, SignupRequest, SignupResponse, LoginRequest, LoginResponse,
        AccountView, AccountUpdate, Challenge, NewChallenge, ChallengeUpdate,
        Company, NewCompany, CompanyUpdate
    )),
    tags(
        (name = "accounts", description = "Signup, login and account operations"),
        (name = "challenges", description = "Challenge operations"),
        (name = "companies", description = "Company operations"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn every_declared_tag_has_operations() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let mut used: Vec<String> = Vec::new();
        for item in doc["paths"].as_object().unwrap().values() {
            for op in item.as_object().unwrap().values() {
                if let Some(tags) = op.get("tags").and_then(Value::as_array) {
                    used.extend(tags.iter().filter_map(Value::as_str).map(str::to_string));
                }
            }
        }
        let declared = doc["tags"].as_array().unwrap();
        assert_eq!(declared.len(), 3);
        for tag in declared {
            let name = tag["name"].as_str().unwrap();
            assert!(used.iter().any(|u| u == name), "tag {name} has no operations");
        }
    }
}
