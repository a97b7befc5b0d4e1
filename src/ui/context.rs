//! Interactive terminal vs CI/pipe detection

use std::io::IsTerminal;

/// Variables set by common CI services besides the generic `CI`
const CI_VARS: [&str; 9] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
    "APPVEYOR",
    "BITBUCKET_BUILD_NUMBER",
];

#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    fancy: bool,
}

impl UiContext {
    /// cliclack output only on a terminal outside CI
    pub fn detect() -> Self {
        let in_ci = CI_VARS.iter().any(|var| std::env::var_os(var).is_some());
        Self {
            fancy: std::io::stdout().is_terminal() && !in_ci,
        }
    }

    /// Plain output regardless of the terminal
    pub fn non_interactive() -> Self {
        Self { fancy: false }
    }

    pub fn use_fancy_output(&self) -> bool {
        self.fancy
    }
}
