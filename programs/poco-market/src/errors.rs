//! Error codes for the PoCo market program

use anchor_lang::prelude::*;

#[error_code]
pub enum PocoError {
    // Order and signature errors (6000-6099)
    #[msg("App order signature is missing or invalid")]
    InvalidAppOrderSignature,

    #[msg("Dataset order signature is missing or invalid")]
    InvalidDatasetOrderSignature,

    #[msg("Workerpool order signature is missing or invalid")]
    InvalidWorkerpoolOrderSignature,

    #[msg("Request order signature is missing or invalid")]
    InvalidRequestOrderSignature,

    #[msg("Supplied order hash does not match the order contents")]
    OrderHashMismatch,

    #[msg("Order has been cancelled")]
    OrderCancelled,

    #[msg("Order volume is fully consumed")]
    OrderFullyConsumed,

    #[msg("Only the order owner can perform this action")]
    UnauthorizedOrderOwner,

    #[msg("Order has an invalid volume")]
    InvalidOrderVolume,

    #[msg("Order restriction list is too long")]
    TooManyRestrictions,

    #[msg("Ed25519 attestation is malformed")]
    MalformedSignatureInstruction,

    // Matching errors (6100-6199)
    #[msg("Request order app does not match app order")]
    AppMismatch,

    #[msg("Request order dataset does not match dataset order")]
    DatasetMismatch,

    #[msg("Request order workerpool does not match workerpool order")]
    WorkerpoolMismatch,

    #[msg("Requester is not allowed by an order restriction")]
    RequesterRestricted,

    #[msg("App is not allowed by an order restriction")]
    AppRestricted,

    #[msg("Dataset is not allowed by an order restriction")]
    DatasetRestricted,

    #[msg("Workerpool is not allowed by an order restriction")]
    WorkerpoolRestricted,

    #[msg("App price exceeds the requester's ceiling")]
    AppPriceTooHigh,

    #[msg("Dataset price exceeds the requester's ceiling")]
    DatasetPriceTooHigh,

    #[msg("Workerpool price exceeds the requester's ceiling")]
    WorkerpoolPriceTooHigh,

    #[msg("Request and workerpool categories differ")]
    CategoryMismatch,

    #[msg("Workerpool trust is below the requested trust")]
    TrustMismatch,

    #[msg("Workerpool or app does not provide the requested tag")]
    TagMismatch,

    #[msg("Start index does not match the request order consumption")]
    StaleStartIndex,

    #[msg("Asset account has the wrong kind")]
    AssetKindMismatch,

    #[msg("Asset account does not match the order")]
    AssetMismatch,

    #[msg("Category not found")]
    CategoryNotFound,

    // Task state errors (6200-6299)
    #[msg("Task index is outside the deal range")]
    TaskIndexOutOfRange,

    #[msg("Task is not active")]
    TaskNotActive,

    #[msg("Task is not revealing")]
    TaskNotRevealing,

    #[msg("Task status transition is not allowed")]
    InvalidStatusTransition,

    #[msg("Contribution deadline has passed")]
    ContributionDeadlineReached,

    #[msg("Reveal deadline has passed")]
    RevealDeadlineReached,

    #[msg("Final deadline has passed")]
    FinalDeadlineReached,

    #[msg("Task cannot be claimed yet")]
    ClaimTooEarly,

    #[msg("Deal final deadline has not passed")]
    DealNotExpired,

    #[msg("Task has no proved contribution")]
    NoRevealedContribution,

    #[msg("Consensus contributors may still reveal")]
    RevealsPending,

    #[msg("Only the workerpool owner can perform this action")]
    UnauthorizedScheduler,

    #[msg("Callback payload does not match the result digest")]
    CallbackDigestMismatch,

    #[msg("Results payload is too long")]
    ResultsTooLong,

    // Contribution and reveal errors (6300-6399)
    #[msg("Worker already contributed to this task")]
    AlreadyContributed,

    #[msg("Task has reached maximum contributions")]
    TaskFullyContributed,

    #[msg("Contribution authorization is missing or invalid")]
    InvalidAuthorization,

    #[msg("An enclave is required for this deal")]
    EnclaveRequired,

    #[msg("Enclave signature is missing or invalid")]
    InvalidEnclaveSignature,

    #[msg("Contribution is not in contributed state")]
    ContributionNotContributed,

    #[msg("Result hash does not match the consensus")]
    ConsensusMismatch,

    #[msg("Revealed digest does not match the result hash")]
    ResultHashMismatch,

    #[msg("Revealed digest does not match the result seal")]
    ResultSealMismatch,

    #[msg("Contribution accounts do not match the task contributors")]
    ContributionAccountMismatch,

    #[msg("Score accounts do not match the task contributors")]
    ScoreAccountMismatch,

    #[msg("Result hash and seal must be non-zero")]
    InvalidResultHash,

    #[msg("Only deals with a trust of one can be finalized on contribution")]
    TrustAboveOne,

    // Ledger errors (6400-6499)
    #[msg("Insufficient free stake")]
    InsufficientStake,

    #[msg("Insufficient locked balance")]
    InsufficientLocked,

    #[msg("Insufficient kitty balance")]
    InsufficientKitty,

    #[msg("Ledger account not found")]
    LedgerNotFound,

    #[msg("Ledger account appears more than once")]
    DuplicateLedgerAccount,

    #[msg("Amount must be greater than zero")]
    InvalidAmount,

    #[msg("Vault has insufficient funds")]
    InsufficientVaultFunds,

    #[msg("Token accounts are required for a token denominated ledger")]
    MissingTokenAccounts,

    #[msg("Token account mint is invalid")]
    InvalidTokenMint,

    #[msg("Token account is not owned by the expected authority")]
    InvalidTokenAccount,

    #[msg("Token transfer failed")]
    TokenTransferFailed,

    // Configuration and account errors (6500-6599)
    #[msg("Invalid account owner")]
    InvalidAccountOwner,

    #[msg("Account address does not match its seeds")]
    InvalidAccountAddress,

    #[msg("Invalid input parameter")]
    InvalidInput,

    #[msg("String exceeds maximum length")]
    StringTooLong,

    #[msg("Percentage must be between 0 and 100")]
    InvalidPercentage,

    #[msg("Deadline ratios must be positive and ordered")]
    InvalidDeadlineRatios,

    #[msg("Work clock time reference must be positive")]
    InvalidWorkClockTimeRef,

    #[msg("Only the asset owner can perform this action")]
    UnauthorizedAssetOwner,

    #[msg("Account version is too old, migration required")]
    AccountVersionTooOld,

    #[msg("Account version is too new, program upgrade required")]
    AccountVersionTooNew,

    #[msg("Protocol config version is inconsistent")]
    VersionMismatchProtocol,

    #[msg("Multisig signer list is invalid")]
    MultisigInvalidSigners,

    #[msg("Multisig threshold is invalid")]
    MultisigInvalidThreshold,

    #[msg("Not enough multisig signers")]
    MultisigNotEnoughSigners,

    #[msg("Multisig signer appears more than once")]
    MultisigDuplicateSigner,

    #[msg("Multisig signer cannot be the default pubkey")]
    MultisigDefaultSigner,

    // Arithmetic
    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
}
