//! Key generation for configs.
//!
//! [`WgKeyGenerator`] asks the `wg` tool, which is what a WireGuard host
//! normally has. [`NativeKeyGenerator`] does the same work in-process.

use tracing::{debug, info};
use wgmesh_config::{strip_whitespace, GenerateKeysOptions, KeyMaterial, WgConfig};

use crate::command::{AllowedProgram, SafeCommand};
use crate::error::{Result, ToolError};

/// Produces key material for a node.
#[allow(async_fn_in_trait)]
pub trait KeyGenerator {
    /// Generates keys, reusing `existing_private_key` when given.
    ///
    /// With an existing private key only the public key is derived.
    async fn generate(
        &self,
        with_pre_shared_key: bool,
        existing_private_key: Option<&str>,
    ) -> Result<KeyMaterial>;
}

/// Generates keys with `wg genkey`, `wg pubkey` and `wg genpsk`.
#[derive(Debug, Clone, Default)]
pub struct WgKeyGenerator {
    program_path: Option<String>,
}

impl WgKeyGenerator {
    /// Uses `wg` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `wg` at a specific path.
    #[must_use]
    pub fn with_program_path(mut self, path: impl Into<String>) -> Self {
        self.program_path = Some(path.into());
        self
    }

    fn command(&self) -> SafeCommand {
        SafeCommand::new(AllowedProgram::Wg).with_program_path_opt(self.program_path.as_deref())
    }

    async fn run(&self, subcommand: &str, stdin: Option<&str>) -> Result<String> {
        let mut cmd = self.command().arg(subcommand);
        if let Some(input) = stdin {
            cmd = cmd.stdin(format!("{input}\n"));
        }
        let output = cmd.execute().await?;
        Ok(strip_whitespace(&output.stdout_lossy()))
    }
}

impl KeyGenerator for WgKeyGenerator {
    async fn generate(
        &self,
        with_pre_shared_key: bool,
        existing_private_key: Option<&str>,
    ) -> Result<KeyMaterial> {
        let private_key = match existing_private_key {
            Some(key) => strip_whitespace(key),
            None => self.run("genkey", None).await?,
        };
        let public_key = self.run("pubkey", Some(&private_key)).await?;
        let pre_shared_key = if with_pre_shared_key {
            Some(self.run("genpsk", None).await?)
        } else {
            None
        };
        debug!(public_key = %public_key, "generated keys with wg");

        Ok(KeyMaterial {
            private_key,
            public_key,
            pre_shared_key,
        })
    }
}

/// Generates keys in-process with x25519.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeKeyGenerator;

impl KeyGenerator for NativeKeyGenerator {
    async fn generate(
        &self,
        with_pre_shared_key: bool,
        existing_private_key: Option<&str>,
    ) -> Result<KeyMaterial> {
        let keys = match existing_private_key {
            Some(key) => KeyMaterial::from_private_key(key, with_pre_shared_key)?,
            None => KeyMaterial::generate(with_pre_shared_key),
        };
        Ok(keys)
    }
}

/// Generates keys for `config` and stores them on it.
///
/// Unless `options.overwrite` is set, an existing private key is kept and
/// only its public key is derived again.
pub async fn generate_keys<G: KeyGenerator>(
    config: &mut WgConfig,
    generator: &G,
    options: GenerateKeysOptions,
) -> Result<KeyMaterial> {
    let existing = config.reusable_private_key(options).map(str::to_string);
    let keys = generator
        .generate(options.pre_shared_key, existing.as_deref())
        .await?;
    config.apply_keys(&keys);
    info!(
        public_key = %keys.public_key,
        reused_private_key = existing.is_some(),
        pre_shared_key = keys.pre_shared_key.is_some(),
        "keys generated"
    );
    Ok(keys)
}

/// Checks that `wg` can be run and returns its version line.
///
/// # Errors
///
/// Returns `NotInstalled` if `wg --version` cannot be run or fails.
pub async fn check_wg_installed(program_path: Option<&str>) -> Result<String> {
    let output = SafeCommand::new(AllowedProgram::Wg)
        .with_program_path_opt(program_path)
        .arg("--version")
        .execute()
        .await
        .map_err(|e| ToolError::not_installed(e.to_string()))?;
    Ok(output.stdout_lossy().trim().to_string())
}
