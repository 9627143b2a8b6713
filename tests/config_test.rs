//! Configuration loading through the public API

use std::io::Write;

use nonced_tx::config::Config;
use nonced_tx::structured_logging::init_logging;
use nonced_tx::tx_builder::NoncedTransactionBuilder;
use nonced_tx::Hash;

const FILE_SUBSIDIZER: &str = "non9MZDuwcTzNYfWFu18XT4MLi3Pf6vscuuMuKTbrTx";
const ENV_SUBSIDIZER: &str = "9eRZTogvYM4WC8PRrw27fpzcZTvEvQuaREQyRETyw46d";

#[test]
fn test_config_file_then_subsidizer_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "[subsidizer]\npublic_key = \"{}\"\n\n[logging]\nlevel = \"nonced_tx=debug\"\n",
        FILE_SUBSIDIZER
    )
    .unwrap();

    let mut config = Config::from_file(file.path()).unwrap();
    let builder = NoncedTransactionBuilder::from_config(&config).unwrap();
    assert_eq!(builder.subsidizer().to_string(), FILE_SUBSIDIZER);

    init_logging(&config.logging).unwrap();

    // Same override from_file_with_env applies for NONCED_TX_SUBSIDIZER
    config.apply_env_override(Some(ENV_SUBSIDIZER)).unwrap();
    let builder = NoncedTransactionBuilder::from_config(&config).unwrap();
    assert_eq!(builder.subsidizer().to_string(), ENV_SUBSIDIZER);

    let tx = builder
        .make_nonced_transaction(
            &FILE_SUBSIDIZER.parse().unwrap(),
            Hash::default(),
            &[nonced_tx::programs::SetComputeUnitLimit { units: 1 }.instruction()],
        )
        .unwrap();
    assert_eq!(tx.message.account_keys[0], *builder.subsidizer());
}

#[test]
fn test_missing_config_file() {
    let err = Config::from_file("/nonexistent/nonced-tx.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
