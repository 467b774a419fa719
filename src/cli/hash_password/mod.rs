//! Hash-password command - prints an Argon2 hash for `admin.password_hash`

use std::io::{self, BufRead};

use clap::Args;

use crate::infrastructure::session::{Argon2Hasher, PasswordHasher};

#[derive(Debug, Args)]
pub struct HashPasswordArgs {
    /// Password to hash; read from stdin when omitted
    pub password: Option<String>,
}

pub fn run(args: HashPasswordArgs) -> anyhow::Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => read_password(io::stdin().lock())?,
    };

    println!("{}", hash(&password)?);

    Ok(())
}

fn read_password(mut input: impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    Ok(password)
}

fn hash(password: &str) -> anyhow::Result<String> {
    Ok(Argon2Hasher::new().hash(password)?)
}
