//! Business logic services

pub mod books;
pub mod tokens;
pub mod users;

use std::sync::Arc;

use mockable::Clock;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub tokens: tokens::TokenService,
    pub users: users::UsersService,
    pub books: books::BooksService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let tokens = tokens::TokenService::from_config(auth_config, clock);

        Self {
            users: users::UsersService::new(repository.users.clone(), tokens.clone()),
            books: books::BooksService::new(repository.books.clone()),
            tokens,
            repository,
        }
    }
}
