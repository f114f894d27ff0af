/// Caller-visible classification of everything the use cases can produce.
///
/// Every error kind maps through an explicit `outcome()` on its error enum,
/// so a new kind has to be deliberately classified here rather than leaking
/// through a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The email field was malformed. Local caller mistake, safe to name the
    /// field.
    InvalidEmail,
    /// Generic rejection. No-session, expired, locked and wrong-code all land
    /// here so the boundary never reveals whether an email has an active
    /// session.
    CodeRejected,
    /// The source address is throttled; callers should back off.
    RateLimited,
    /// Store or delivery failure. Logged with full detail internally,
    /// surfaced as an opaque failure, never retried by this layer.
    Infrastructure,
}
