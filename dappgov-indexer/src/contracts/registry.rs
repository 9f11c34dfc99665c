//! Dapp registry bindings

use alloy_sol_types::sol;

sol! {
    event DappPublished(uint256 indexed dappId, uint256 indexed versionId, bytes rootCid);
    event DappUpgraded(uint256 indexed dappId, uint256 indexed versionId, bytes rootCid);
    event DappMetadata(uint256 indexed dappId, uint256 indexed versionId, string name, string version, string description);
    event DappPaused(uint256 indexed dappId, uint256 indexed versionId);
    event DappUnpaused(uint256 indexed dappId, uint256 indexed versionId);
    event DappDeprecated(uint256 indexed dappId, uint256 indexed versionId);

    function publishDapp(bytes rootCid, string name, string version, string description) external returns (uint256 dappId, uint256 versionId);
    function upgradeDapp(uint256 dappId, bytes rootCid, string name, string version, string description) external returns (uint256 versionId);
}
