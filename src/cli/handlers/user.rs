//! `tickefic user` subcommands

use super::HandlerContext;
use crate::auth::password::hash_password;
use crate::cli::output::OutputFormatter;
use crate::config::Settings;
use crate::core::{User, UserId};
use crate::error::{Result, TickeficError};
use crate::storage::UserRepository;
use chrono::Utc;
use serde_json::json;

pub struct NewUserArgs {
    pub login: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub display_name: Option<String>,
}

pub fn handle_user_add(settings: &Settings, args: NewUserArgs, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::open(settings)?;
    if !ctx.store.roles()?.contains(&args.role) {
        return Err(TickeficError::UnknownRole(args.role));
    }
    if args.login.trim().is_empty() {
        return Err(TickeficError::invalid_param("login", "must not be empty"));
    }

    let user = ctx.store.insert_user(User {
        id: UserId(0),
        display_name: args.display_name.unwrap_or_else(|| args.login.clone()),
        login: args.login,
        email: args.email.trim().to_lowercase(),
        password_hash: hash_password(&args.password)?,
        roles: vec![args.role],
        registered_at: Utc::now(),
    })?;

    if formatter.is_json() {
        return formatter.json(&json!({
            "id": user.id,
            "login": user.login,
            "email": user.email,
            "roles": user.roles,
        }));
    }
    formatter.success(&format!("Created user '{}' (ID {})", user.login, user.id));
    Ok(())
}

pub fn handle_user_list(settings: &Settings, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::open(settings)?;
    let users = ctx.store.all_users()?;

    if formatter.is_json() {
        let users: Vec<_> = users
            .iter()
            .map(|u| json!({ "id": u.id, "login": u.login, "name": u.display_name, "email": u.email, "roles": u.roles }))
            .collect();
        return formatter.json(&users);
    }
    if users.is_empty() {
        formatter.info("No users");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.id.to_string(),
                u.login.clone(),
                u.display_name.clone(),
                u.email.clone(),
                u.roles.join(", "),
            ]
        })
        .collect();
    formatter.table(&["ID", "Login", "Name", "Email", "Roles"], &rows);
    Ok(())
}
