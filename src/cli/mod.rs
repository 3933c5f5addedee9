use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start MCP (Model Context Protocol) server for integration with AI tools
    Mcp {
        /// Run as HTTP server on specified port (e.g., --http 8080)
        #[arg(long)]
        http: Option<u16>,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,
    },

    /// List configured storages
    List,

    /// Show the connection settings of one storage (password omitted)
    Info { storage_id: String },

    /// Run a read query
    Query {
        storage_id: String,

        query: String,

        /// Query parameters as JSON (a positional array for SQL backends)
        #[arg(long)]
        params: Option<String>,
    },

    /// Run a write operation (requires write mode on the storage)
    Execute {
        storage_id: String,

        operation: String,

        /// Operation parameters as JSON
        #[arg(long)]
        params: Option<String>,
    },

    /// List tables or collections
    Collections {
        storage_id: String,

        /// Database or schema to list instead of the configured one
        #[arg(short, long)]
        schema: Option<String>,
    },

    /// Describe a table or collection
    Describe {
        storage_id: String,

        collection: String,

        #[arg(short, long)]
        schema: Option<String>,
    },
}
