//! `keys`: generate keys for a config file.

use std::io::Write;

use wgmesh_config::GenerateKeysOptions;
use wgmesh_tools::{generate_keys, read_config, write_config, KeyGenerator};

use crate::cli::KeysArgs;
use crate::commands::display_path;
use crate::error::CliError;
use crate::output::{KeysReport, OutputFormat};

/// Keys command executor.
pub struct KeysCommand<'a, G> {
    generator: &'a G,
}

impl<'a, G: KeyGenerator> KeysCommand<'a, G> {
    /// Create a new keys command.
    #[must_use]
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    /// Generates keys, writes the file back and prints the public key.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &KeysArgs,
    ) -> Result<(), CliError> {
        let mut config = read_config(&args.file).await?;
        let options = GenerateKeysOptions {
            pre_shared_key: args.psk,
            overwrite: args.overwrite,
        };
        let reused_private_key = config.reusable_private_key(options).is_some();
        let keys = generate_keys(&mut config, self.generator, options).await?;
        let path = write_config(&config, None).await?;

        let report = KeysReport {
            file: display_path(Some(&path)),
            public_key: keys.public_key.clone(),
            pre_shared_key: keys.pre_shared_key.clone(),
            reused_private_key,
        };
        format.write(writer, &report)
    }
}
