use crate::model::*;
use sled::transaction::{abort, ConflictableTransactionResult, TransactionError};
use std::fmt;

// Big-endian keys keep sled's iteration order equal to insertion order.
fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn deserialize_id<V: AsRef<[u8]>>(id: V) -> Result<u64, DbError> {
    use std::convert::TryInto;
    id.as_ref()
        .try_into()
        .map(u64::from_be_bytes)
        .map_err(|_| DbError::CorruptKey)
}

#[derive(Debug)]
pub enum DbError {
    Storage(sled::Error),
    Encoding(bincode::Error),
    CorruptKey,
    NotFound,
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Storage(e) => write!(f, "Storage error: {}", e),
            DbError::Encoding(e) => write!(f, "Encoding error: {}", e),
            DbError::CorruptKey => write!(f, "Corrupt record key"),
            DbError::NotFound => write!(f, "Record not found"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<sled::Error> for DbError {
    fn from(e: sled::Error) -> Self {
        DbError::Storage(e)
    }
}

impl From<bincode::Error> for DbError {
    fn from(e: bincode::Error) -> Self {
        DbError::Encoding(e)
    }
}

fn unwrap_transaction<T>(result: Result<T, TransactionError<DbError>>) -> Result<T, DbError> {
    result.map_err(|err| match err {
        TransactionError::Storage(e) => DbError::Storage(e),
        TransactionError::Abort(e) => e,
    })
}

pub trait MovieDb {
    type Error;
    fn add_movie(&self, movie: &Movie) -> Result<u64, Self::Error>;
    fn get_movie(&self, id: u64) -> Result<Option<Movie>, Self::Error>;
    fn update_movie(&self, id: u64, movie: &Movie) -> Result<(), Self::Error>;
    fn remove_movie(&self, id: u64) -> Result<Movie, Self::Error>;
    fn list_movies(&self) -> Result<Vec<(u64, Movie)>, Self::Error>;
    fn clear_movies(&self) -> Result<(), Self::Error>;
}

const MOVIES: &[u8] = b"movies";

impl MovieDb for sled::Db {
    type Error = DbError;

    fn add_movie(&self, movie: &Movie) -> Result<u64, DbError> {
        let movies = self.open_tree(MOVIES)?;
        let id = self.generate_id()?;
        movies.insert(&serialize_id(id)[..], bincode::serialize(movie)?)?;
        Ok(id)
    }

    fn get_movie(&self, id: u64) -> Result<Option<Movie>, DbError> {
        let movies = self.open_tree(MOVIES)?;
        match movies.get(serialize_id(id))? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    fn update_movie(&self, id: u64, movie: &Movie) -> Result<(), DbError> {
        let movies = self.open_tree(MOVIES)?;
        let key = serialize_id(id);
        let value = bincode::serialize(movie)?;
        let result = movies.transaction(|movies| -> ConflictableTransactionResult<(), DbError> {
            if movies.get(&key[..])?.is_none() {
                return abort(DbError::NotFound);
            }
            movies.insert(&key[..], value.as_slice())?;
            Ok(())
        });
        unwrap_transaction(result)
    }

    fn remove_movie(&self, id: u64) -> Result<Movie, DbError> {
        let movies = self.open_tree(MOVIES)?;
        let old = movies
            .remove(serialize_id(id))?
            .ok_or(DbError::NotFound)?;
        Ok(bincode::deserialize(&old)?)
    }

    fn list_movies(&self) -> Result<Vec<(u64, Movie)>, DbError> {
        let movies = self.open_tree(MOVIES)?;
        movies
            .iter()
            .map(|entry| -> Result<(u64, Movie), DbError> {
                let (key, data) = entry?;
                Ok((deserialize_id(key)?, bincode::deserialize(&data)?))
            })
            .collect()
    }

    fn clear_movies(&self) -> Result<(), DbError> {
        let movies = self.open_tree(MOVIES)?;
        movies.clear()?;
        Ok(())
    }
}

/// Storage for the deployment's single administrator.
///
/// The record lives under a fixed key, so there is never a question of which
/// user row is "the" admin.
pub trait AdminDb {
    type Error;
    fn get_admin(&self) -> Result<Option<User>, Self::Error>;
    fn put_admin(&self, user: &User) -> Result<(), Self::Error>;
    fn rename_admin(&self, name: &str) -> Result<User, Self::Error>;
    fn clear_admin(&self) -> Result<(), Self::Error>;
}

const ADMIN: &[u8] = b"admin";
const ADMIN_KEY: &[u8] = b"admin";

impl AdminDb for sled::Db {
    type Error = DbError;

    fn get_admin(&self) -> Result<Option<User>, DbError> {
        let admin = self.open_tree(ADMIN)?;
        match admin.get(ADMIN_KEY)? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    fn put_admin(&self, user: &User) -> Result<(), DbError> {
        let admin = self.open_tree(ADMIN)?;
        admin.insert(ADMIN_KEY, bincode::serialize(user)?)?;
        Ok(())
    }

    fn rename_admin(&self, name: &str) -> Result<User, DbError> {
        let admin = self.open_tree(ADMIN)?;
        let result = admin.transaction(|admin| -> ConflictableTransactionResult<User, DbError> {
            let data = match admin.get(ADMIN_KEY)? {
                Some(data) => data,
                None => return abort(DbError::NotFound),
            };
            let mut user: User = match bincode::deserialize(&data) {
                Ok(user) => user,
                Err(e) => return abort(DbError::Encoding(e)),
            };
            user.name = name.to_owned();
            let value = match bincode::serialize(&user) {
                Ok(value) => value,
                Err(e) => return abort(DbError::Encoding(e)),
            };
            admin.insert(ADMIN_KEY, value)?;
            Ok(user)
        });
        unwrap_transaction(result)
    }

    fn clear_admin(&self) -> Result<(), DbError> {
        let admin = self.open_tree(ADMIN)?;
        admin.clear()?;
        Ok(())
    }
}

/// Creates the trees, optionally erasing everything first.
pub fn initialize(db: &sled::Db, drop: bool) -> Result<(), DbError> {
    if drop {
        db.clear_movies()?;
        db.clear_admin()?;
    }
    db.open_tree(MOVIES)?;
    db.open_tree(ADMIN)?;
    db.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temporary() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    fn admin() -> User {
        User {
            name: "Admin".to_owned(),
            username: "admin".to_owned(),
            password_hash: "not-a-real-hash".to_owned(),
        }
    }

    #[test]
    fn list_keeps_creation_order() {
        let db = temporary();
        let titles = ["Leon", "WALL-E", "Mahjong"];
        for title in titles.iter() {
            db.add_movie(&Movie::new(*title, "1994")).unwrap();
        }
        let listed: Vec<String> = db
            .list_movies()
            .unwrap()
            .into_iter()
            .map(|(_, m)| m.title)
            .collect();
        assert_eq!(listed, titles);
    }

    #[test]
    fn update_then_get() {
        let db = temporary();
        let id = db.add_movie(&Movie::new("Leon", "1994")).unwrap();
        db.update_movie(id, &Movie::new("Leon: The Professional", "1995"))
            .unwrap();
        assert_eq!(
            db.get_movie(id).unwrap(),
            Some(Movie::new("Leon: The Professional", "1995"))
        );
    }

    #[test]
    fn update_missing() {
        let db = temporary();
        match db.update_movie(42, &Movie::new("Leon", "1994")) {
            Err(DbError::NotFound) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(db.list_movies().unwrap().is_empty());
    }

    #[test]
    fn remove_twice() {
        let db = temporary();
        let id = db.add_movie(&Movie::new("Leon", "1994")).unwrap();
        assert_eq!(db.remove_movie(id).unwrap(), Movie::new("Leon", "1994"));
        assert!(matches!(db.remove_movie(id), Err(DbError::NotFound)));
        assert_eq!(db.get_movie(id).unwrap(), None);
    }

    #[test]
    fn clear_movies() {
        let db = temporary();
        db.add_movie(&Movie::new("Leon", "1994")).unwrap();
        db.add_movie(&Movie::new("WALL-E", "2008")).unwrap();
        db.clear_movies().unwrap();
        assert!(db.list_movies().unwrap().is_empty());
    }

    #[test]
    fn initialize_with_drop() {
        let db = temporary();
        db.add_movie(&Movie::new("Leon", "1994")).unwrap();
        db.put_admin(&admin()).unwrap();
        initialize(&db, false).unwrap();
        assert_eq!(db.list_movies().unwrap().len(), 1);
        initialize(&db, true).unwrap();
        assert!(db.list_movies().unwrap().is_empty());
        assert_eq!(db.get_admin().unwrap(), None);
    }

    #[test]
    fn admin_singleton() {
        let db = temporary();
        assert_eq!(db.get_admin().unwrap(), None);
        db.put_admin(&admin()).unwrap();
        let mut other = admin();
        other.username = "root".to_owned();
        db.put_admin(&other).unwrap();
        assert_eq!(db.get_admin().unwrap(), Some(other));
    }

    #[test]
    fn rename_admin() {
        let db = temporary();
        assert!(matches!(db.rename_admin("Jeffrey"), Err(DbError::NotFound)));
        db.put_admin(&admin()).unwrap();
        let renamed = db.rename_admin("Jeffrey").unwrap();
        assert_eq!(renamed.name, "Jeffrey");
        assert_eq!(renamed.username, "admin");
        assert_eq!(db.get_admin().unwrap(), Some(renamed));
    }
}
