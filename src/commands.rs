//! Administrative commands run from the command line.

use crate::auth::hash_password;
use crate::database::{self, AdminDb, MovieDb};
use crate::model::{Movie, User};
use crate::validate::{validate_credentials, validate_name};
use anyhow::{bail, Result};
use log::{info, warn};
use rustyline::DefaultEditor;

const DEMO_MOVIES: &[(&str, &str)] = &[
    ("My Neighbor Totoro", "1988"),
    ("Dead Poets Society", "1989"),
    ("A Perfect World", "1993"),
    ("Leon", "1994"),
    ("Mahjong", "1996"),
    ("Swallowtail Butterfly", "1996"),
    ("King of Comedy", "1999"),
    ("Devils on the Doorstep", "1999"),
    ("WALL-E", "2008"),
    ("The Pork of Music", "2012"),
];

pub fn initdb(db: &sled::Db, drop: bool) -> Result<()> {
    if drop {
        warn!("Dropping all movies and the admin account");
    }
    database::initialize(db, drop)?;
    println!("Initialized database.");
    Ok(())
}

/// Seeds the demo movies and names the admin, if there is one.
pub fn forge(db: &sled::Db, name: &str) -> Result<usize> {
    if !validate_name(name) {
        bail!("Display name must be 1 to 20 characters");
    }
    database::initialize(db, false)?;
    for (title, year) in DEMO_MOVIES {
        db.add_movie(&Movie::new(*title, *year))?;
    }
    match db.get_admin()? {
        Some(_) => {
            db.rename_admin(name)?;
        }
        None => warn!("No admin configured yet, run `watchlist admin` to create one"),
    }
    db.flush()?;
    println!("Done.");
    Ok(DEMO_MOVIES.len())
}

/// Creates the admin, or replaces the credentials of the existing one.
pub fn admin(db: &sled::Db, username: &str, password: &str, cost: u32) -> Result<User> {
    if !validate_credentials(username, password) {
        bail!("Username must be 1 to 20 characters and the password must not be empty");
    }
    let password_hash = hash_password(password, cost)?;
    let user = match db.get_admin()? {
        Some(mut user) => {
            println!("Updating user...");
            user.username = username.to_owned();
            user.password_hash = password_hash;
            user
        }
        None => {
            println!("Creating user...");
            User {
                name: "Admin".to_owned(),
                username: username.to_owned(),
                password_hash,
            }
        }
    };
    db.put_admin(&user)?;
    db.flush()?;
    info!("Admin account is now {:?}", user.username);
    println!("Done.");
    Ok(user)
}

/// Asks for whatever credentials were not given on the command line.
pub fn prompt_credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<(String, String)> {
    let mut rl = DefaultEditor::new()?;
    let username = match username {
        Some(username) => username,
        None => rl.readline("Username: ")?.trim().to_owned(),
    };
    let password = match password {
        Some(password) => password,
        None => {
            warn!(
                "The password is echoed as you type; \
                 pass --password or set WATCHLIST_ADMIN_PASSWORD to avoid this"
            );
            let password = rl.readline("Password: ")?;
            let confirmation = rl.readline("Repeat for confirmation: ")?;
            if password != confirmation {
                bail!("The two entered values do not match");
            }
            password
        }
    };
    Ok((username, password))
}
