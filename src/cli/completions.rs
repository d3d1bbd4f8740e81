use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    gadgetize completions --shell bash > ~/.bash_completion.d/gadgetize\n\n\
                  Generate zsh completions:\n    gadgetize completions --shell zsh > ~/.zfunc/_gadgetize\n\n\
                  Generate fish completions:\n    gadgetize completions --shell fish > ~/.config/fish/completions/gadgetize.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long, short = 's')]
    pub shell: String,
}
