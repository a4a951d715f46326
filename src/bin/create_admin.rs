// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bootstrap tool for administrator accounts.
//!
//! Admin creation over HTTP needs a super admin token, so the first account
//! has to be written straight into the store:
//!
//! ```text
//! create-admin <data_dir> <username> <password> [rank]
//! create-admin hash <password>
//! ```
//!
//! `rank` defaults to 1 (super admin). `hash` only prints the encoded
//! password hash. Stop the server first: the account database takes an
//! exclusive lock.

use std::{env, path::PathBuf, process::ExitCode};

use gatekeeper_server::auth::{password, AdminRank};
use gatekeeper_server::models::{CreateAdminRequest, Validate};
use gatekeeper_server::storage::{self, AccountStore, AccountStoreError, NewAdmin};

const USAGE: &str = "usage:\n  create-admin <data_dir> <username> <password> [rank]\n  create-admin hash <password>";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let result = match args.as_slice() {
        [cmd, pw] if cmd == "hash" => {
            println!("{}", password::hash_password(pw));
            Ok(())
        }
        [data_dir, username, pw] => create(data_dir, username, pw, AdminRank::SuperAdmin.value()),
        [data_dir, username, pw, rank] => match rank.parse::<i64>() {
            Ok(rank) => create(data_dir, username, pw, rank),
            Err(_) => Err(format!("rank must be an integer, got {rank:?}")),
        },
        _ => Err(USAGE.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn create(data_dir: &str, username: &str, pw: &str, role: i64) -> Result<(), String> {
    let req = CreateAdminRequest {
        username: username.to_string(),
        password: pw.to_string(),
        role,
    };
    req.validate().map_err(|e| format!("invalid parameters: {e}"))?;
    let rank = req.rank().ok_or_else(|| format!("unknown rank {role}"))?;

    let path = storage::accounts_path(&PathBuf::from(data_dir));
    let store =
        AccountStore::open(&path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;

    let admin = store
        .create_admin(NewAdmin {
            username: req.username,
            password_hash: password::hash_password(&req.password),
            rank,
        })
        .map_err(|e| match e {
            AccountStoreError::UsernameTaken => format!("admin {username:?} already exists"),
            other => other.to_string(),
        })?;

    println!("created admin #{} {:?}, rank {}", admin.id, admin.username, admin.rank);
    Ok(())
}
