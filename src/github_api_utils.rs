pub mod github_api_helper;
pub mod repos_report;

pub(crate) mod list_repos_api_response {
    // `GET /users/{username}/repos` returns a bare json array of these,
    // every other field of the repository object is ignored.
    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Repo {
        pub(crate) name: String,
    }
}
