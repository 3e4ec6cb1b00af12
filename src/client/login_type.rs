/// The kind of credential a session authenticates with.
///
/// Most of the object model behaves identically for both, but voice signaling
/// is only available to bot logins; see
/// [`VoiceGateway::adapter_factory`](crate::gateway::voice::VoiceGateway::adapter_factory).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoginType {
    /// An application bot account.
    Bot,
    /// A regular user account.
    User,
}
