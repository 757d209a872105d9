use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Save the currently logged-in account under a new number
    Save,

    /// Make a saved account the live one
    Switch {
        /// Account number as shown by `acct list`
        account: u32,
    },

    /// List saved accounts in save order
    List,

    /// Show which account is live and whether the stored pointer agrees
    Status,

    /// Masked diagnostics for the live and saved credentials
    Debug,

    /// Rename legacy email-keyed backup files
    Migrate,

    /// Remove backup files for accounts that are no longer saved
    Cleanup,

    /// Refresh status on an interval until interrupted
    Watch,
}
