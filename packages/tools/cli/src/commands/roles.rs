//! 역할 목록

use akt_core::permissions::Role;
use serde::Deserialize;

use crate::commands::{http, print_json, Invocation};

pub async fn list(inv: &Invocation) -> anyhow::Result<()> {
    #[derive(Deserialize)]
    struct Resp {
        roles: Vec<Role>,
    }

    let resp: Resp = http::send_json(http::with_auth(
        &inv.config,
        http::client().get(inv.url("/api/roles")),
    )?)
    .await?;

    if inv.is_json() {
        return print_json(&resp.roles);
    }

    if resp.roles.is_empty() {
        println!("No roles.");
        return Ok(());
    }

    for role in resp.roles {
        let mut flags = Vec::new();
        if role.is_super_admin {
            flags.push("super admin");
        }
        if role.is_default {
            flags.push("default");
        }
        print!("- {} {} ({})", role.id, role.name, role.label);
        if !flags.is_empty() {
            print!(" [{}]", flags.join(", "));
        }
        println!();
    }

    Ok(())
}
