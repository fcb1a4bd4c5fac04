use actix_web::test::TestRequest;
use chrono::Utc;
use tempfile::TempDir;

use crate::auth::jwt::generate_access_token;
use crate::config::Config;
use crate::model::{
    role::Role,
    user::{NewUser, User},
};
use crate::storage::FileStorage;
use crate::store::Store;

pub struct TestCtx {
    pub store: Store,
    pub config: Config,
    pub storage: FileStorage,
    pub dir: TempDir,
}

impl TestCtx {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests(dir.path());
        let storage = FileStorage::new(dir.path(), config.max_upload_bytes);
        Self {
            store: Store::in_memory(),
            config,
            storage,
            dir,
        }
    }

    /// Creates a user and returns it with a valid access token.
    pub async fn user(&self, name: &str, role: Role) -> (User, String) {
        let user = self
            .store
            .users
            .create(NewUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "unused".into(),
                role,
                created_at: Utc::now().naive_utc(),
            })
            .await
            .unwrap();
        let token = generate_access_token(
            user.id,
            user.username.clone(),
            role,
            &self.config.jwt_secret,
            self.config.access_token_ttl,
        )
        .unwrap();
        (user, token)
    }
}

fn authed(req: TestRequest, uri: &str, token: &str) -> TestRequest {
    req.uri(uri)
        .insert_header(("Authorization", format!("Bearer {token}")))
}

pub fn get(uri: &str, token: &str) -> TestRequest {
    authed(TestRequest::get(), uri, token)
}

pub fn post(uri: &str, token: &str) -> TestRequest {
    authed(TestRequest::post(), uri, token)
}

pub fn put(uri: &str, token: &str) -> TestRequest {
    authed(TestRequest::put(), uri, token)
}

pub fn delete(uri: &str, token: &str) -> TestRequest {
    authed(TestRequest::delete(), uri, token)
}
