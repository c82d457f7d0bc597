use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// classify every textarea of a saved HTML page.
    SCAN {
        /// path to the html file
        file: String,
        /// print the result as json
        #[clap(short, long)]
        json: bool,
    },
    /// optimize a prompt with the configured provider.
    OPTIMIZE(OptimizeArgs),
    /// check that the provider answers with the given credentials.
    TestConnection(ProviderArgs),
}

/// Provider selection shared by the commands that call a provider.
#[derive(Args)]
pub struct ProviderArgs {
    /// openai, anthropic, google or custom
    #[clap(short, long, default_value = "openai")]
    pub provider: String,
    /// API key for the provider
    #[clap(short = 'k', long, env = "OPTIMO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Chat completions endpoint, required for the custom provider
    #[clap(short, long)]
    pub endpoint: Option<String>,
    /// Model name, defaults to the provider's default model
    #[clap(short, long)]
    pub model: Option<String>,
    /// Provider settings JSON file (llmProvider, apiKey, customEndpoint, modelName)
    #[clap(long)]
    pub provider_config: Option<String>,
}

#[derive(Args)]
pub struct OptimizeArgs {
    /// the prompt to optimize
    pub text: String,
    /// Writing tone
    #[clap(long, default_value = "Professional")]
    pub tone: String,
    /// Concise, Default or Elaborate
    #[clap(long, default_value = "Default")]
    pub length: String,
    /// Default, JSON, List, Table or Steps
    #[clap(long, default_value = "Default")]
    pub format: String,
    /// Who the model should act as
    #[clap(long, default_value = "Expert")]
    pub persona: String,
    /// Who the answer is for
    #[clap(long, default_value = "General")]
    pub audience: String,
    /// Things the answer should avoid
    #[clap(long, default_value = "")]
    pub avoid: String,
    /// freemium or premium
    #[clap(long, default_value = "freemium")]
    pub tier: String,
    /// Account id used for the upgrade link
    #[clap(long)]
    pub user_id: Option<String>,
    #[clap(flatten)]
    pub provider: ProviderArgs,
}
