//! Promotes an existing account to Admin.
//!
//! ```text
//! make_admin jdoe@company.com
//! ```

use anyhow::{Context, bail};
use clap::Parser;

use wms::config::DatabaseConfig;
use wms::db::init_db;
use wms::model::role::Role;
use wms::store::Store;

#[derive(Debug, Parser)]
#[command(about = "Grant the Admin role to a registered user")]
struct Args {
    /// Email the account was registered with
    email: String,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let database = DatabaseConfig::from_env()?;
    let store = Store::mysql(init_db(&database).await?);

    let email = args.email.trim().to_lowercase();
    let Some(user) = store
        .users
        .find_by_email(&email)
        .await
        .context("Failed to look up user")?
    else {
        bail!("No user with email {email}");
    };

    if user.role == Role::Admin {
        println!("{} is already an Admin", user.username);
        return Ok(());
    }

    store
        .users
        .set_role(user.id, Role::Admin)
        .await
        .context("Failed to update role")?;
    println!("{} ({}) is now an Admin", user.username, email);
    Ok(())
}
