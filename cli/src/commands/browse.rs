//! Interactive browser over the user directory.
//!
//! The list shown is whatever the store's filtered subscription last
//! delivered. Every other applied change is traced at debug level.

use std::fmt;

use anyhow::{Context as _, Result};
use inquire::{Confirm, Select, Text};
use tracing::{debug, instrument};
use userdir_business::{User, UserDirectoryStore};

use super::show::print_user;
use crate::context::load_and_wait;
use crate::output::Output;

#[derive(Debug, Clone)]
enum MenuItem {
    User(User),
    Search,
    ClearSearch(String),
    Reload,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "#{:<3} {} <{}>", user.id, user.name, user.email),
            Self::Search => write!(f, "🔍 Search..."),
            Self::ClearSearch(query) => write!(f, "✗ Clear search \"{query}\""),
            Self::Reload => write!(f, "↻ Reload"),
            Self::Quit => write!(f, "Quit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserAction {
    Approve,
    Delete,
    Back,
}

impl UserAction {
    const ALL: [Self; 3] = [Self::Approve, Self::Delete, Self::Back];

    fn verb(self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::Delete => "Delete",
            Self::Back => "Back",
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

fn build_menu(users: &[User], query: &str) -> Vec<MenuItem> {
    let mut menu: Vec<MenuItem> = users.iter().cloned().map(MenuItem::User).collect();
    menu.push(MenuItem::Search);
    if !query.trim().is_empty() {
        menu.push(MenuItem::ClearSearch(query.to_owned()));
    }
    menu.push(MenuItem::Reload);
    menu.push(MenuItem::Quit);
    menu
}

fn menu_title(count: usize, query: &str) -> String {
    if query.trim().is_empty() {
        format!("Users ({count}):")
    } else {
        format!("Users matching \"{query}\" ({count}):")
    }
}

fn confirm(message: &str, default: bool) -> Result<bool> {
    let answer = Confirm::new(message)
        .with_default(default)
        .prompt_skippable()
        .context("Failed to read confirmation")?;
    Ok(answer.unwrap_or(false))
}

fn act_on_user(store: &mut UserDirectoryStore, out: &Output, user: &User) -> Result<()> {
    print_user(out, user);

    let action = Select::new("Action:", UserAction::ALL.to_vec())
        .prompt_skippable()
        .context("Failed to select action")?;
    let Some(action) = action.filter(|action| *action != UserAction::Back) else {
        return Ok(());
    };

    if !confirm(&format!("{} {}?", action.verb(), user.name), false)? {
        return Ok(());
    }
    let removed = match action {
        UserAction::Approve => store.approve_user(user),
        UserAction::Delete => store.delete_user(user),
        UserAction::Back => false,
    };
    if removed {
        out.success(format!("{}d {}", action.verb(), user.name));
    } else {
        out.dim(format!("{} is no longer in the list", user.name));
    }
    Ok(())
}

#[instrument(skip_all, name = "browse")]
pub async fn run_browse(mut store: UserDirectoryStore) -> Result<()> {
    let out = Output::new();
    let changes = store.subscribe();
    let filtered = store.subscribe_filtered();
    let mut visible = Vec::new();

    load_and_wait(&mut store).await;

    loop {
        for state in changes.try_iter() {
            debug!(
                loading = state.is_loading,
                users = state.users.len(),
                query = %state.search_query,
                error = ?state.error,
                "directory changed"
            );
        }
        if let Some(latest) = filtered.try_iter().last() {
            visible = latest;
        }

        if let Some(err) = store.state().error.clone() {
            out.error(&err);
            if confirm("Retry?", true)? {
                store.retry();
                store.settle().await;
                continue;
            }
            store.clear_error();
            if store.state().users.is_empty() {
                break;
            }
            continue;
        }

        let query = store.state().search_query.clone();
        let title = menu_title(visible.len(), &query);
        let choice = Select::new(&title, build_menu(&visible, &query))
            .with_page_size(15)
            .with_help_message("Use arrow keys to navigate, Enter to select, Esc to quit")
            .prompt_skippable()
            .context("Failed to select user")?;

        match choice {
            Some(MenuItem::User(user)) => act_on_user(&mut store, &out, &user)?,
            Some(MenuItem::Search) => {
                let input = Text::new("Search:")
                    .with_initial_value(&query)
                    .with_help_message("Matches name or email, ignoring case")
                    .prompt_skippable()
                    .context("Failed to read search query")?;
                if let Some(input) = input {
                    store.set_search_query(input);
                }
            }
            Some(MenuItem::ClearSearch(_)) => store.set_search_query(""),
            Some(MenuItem::Reload) => load_and_wait(&mut store).await,
            Some(MenuItem::Quit) | None => break,
        }
    }

    store.shutdown().await;
    Ok(())
}
