use std::io::{BufRead, Write};

use crate::error::{KataError, Result};
use crate::github_api_utils::list_repos_api_response::Repo;
use crate::prompt_utils::Prompt;

/// Repositories requested per page.
pub const PAGE_SIZE: u32 = 20;
/// Accumulator cap: no more than this many names are ever reported.
pub const MAX_REPOS: usize = 50;
const MAX_USERNAME_LEN: usize = 39;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub username: &'a str,
    pub page_size: u32,
    pub page_number: u32,
}

/// Anything able to serve one page of a user's repositories.
pub(crate) trait RepoPageSource {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Repo>>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum RepoListing {
    Found(Vec<String>),
    /// The very first page came back empty.
    NoRepositories,
}

impl RepoListing {
    #[cfg(test)]
    pub fn into_names(self) -> Vec<String> {
        match self {
            RepoListing::Found(names) => names,
            RepoListing::NoRepositories => Vec::new(),
        }
    }
}

/// Walks the pages of `username` from page 1 until a page is empty or
/// `MAX_REPOS` names are collected. Any error stops the walk right away.
pub(crate) async fn fetch_all<S: RepoPageSource>(source: &S, username: &str) -> Result<RepoListing> {
    let mut names: Vec<String> = Vec::new();
    let mut page_number = 1;

    loop {
        let request = PageRequest {
            username,
            page_size: PAGE_SIZE,
            page_number,
        };
        let repositories = source.fetch_page(&request).await?;

        if repositories.is_empty() {
            if page_number == 1 {
                info!("{username} has no repository");
                return Ok(RepoListing::NoRepositories);
            }
            break;
        }

        names.extend(repositories.into_iter().map(|repo| repo.name));

        if names.len() >= MAX_REPOS {
            names.truncate(MAX_REPOS);
            break;
        }
        page_number += 1;
    }

    info!(
        "Collected {} repositories of {username} in {page_number} page(s)",
        names.len()
    );
    Ok(RepoListing::Found(names))
}

/// Header, then one `<index> - <name>` line per repository.
pub fn render<S: AsRef<str>>(names: &[S]) -> String {
    let mut lines = vec![String::from("GitHub Report"), String::from("--------------")];
    lines.extend(
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| format!("{idx} - {}", name.as_ref())),
    );
    lines.join("\n")
}

/// GitHub handles are 1 to 39 ascii letters, digits or hyphens.
fn check_username(username: &str) -> Result<&str> {
    let username = username.trim();
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        return Err(KataError::InvalidInput {
            message: format!("'{username}' is not a valid GitHub username"),
        });
    }
    Ok(username)
}

async fn user_report<S: RepoPageSource>(source: &S, username: &str) -> Result<String> {
    let username = check_username(username)?;
    Ok(match fetch_all(source, username).await? {
        RepoListing::Found(names) => render(&names),
        RepoListing::NoRepositories => {
            format!("The {username} have no repository\n\n{}", render::<&str>(&[]))
        }
    })
}

/// Entry point of the `github` subcommand: a single report for `username`,
/// or the interactive loop when no username was given.
pub(crate) async fn run_repos_kata<S, R, W>(
    source: &S,
    prompt: &mut Prompt<R, W>,
    username: Option<String>,
) -> Result<()>
where
    S: RepoPageSource,
    R: BufRead,
    W: Write,
{
    if let Some(username) = username {
        let report = user_report(source, &username).await?;
        return prompt.say(&report);
    }

    loop {
        let username = match prompt.ask("Enter a user name: ")? {
            Some(username) => username,
            None => break,
        };
        if username.is_empty() {
            continue;
        }

        let outcome = user_report(source, &username).await;
        prompt.show_outcome(outcome)?;

        if !prompt.confirm("Would you like to continue? (y/n): ", false)? {
            break;
        }
    }
    Ok(())
}
