use hmac::{Hmac, Mac as _, NewMac as _};
use secstr::SecStr;
use sha1::Sha1;
use subtle::ConstantTimeEq as _;

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

const ALGORITHM: &str = "sha1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("`X-Hub-Signature` is missing or isn't of form `<algorithm>=<hex digest>`")]
    MalformedSignature,
    #[error("unsupported signature algorithm `{0}`")]
    UnsupportedAlgorithm(String),
    #[error("signature doesn't match")]
    SignatureMismatch,
    #[error("failed computing HMAC: {0}")]
    InternalVerificationError(String),
}

/// Checks that `body` was signed with `secret`.
///
/// `header` is the raw value of `X-Hub-Signature`. The digest is computed over
/// the body exactly as received and compared in constant time.
pub fn authorized(secret: &SecStr, body: &[u8], header: Option<&str>) -> Result<(), Error> {
    let header = header.ok_or(Error::MalformedSignature)?;
    let parts: Vec<&str> = header.split('=').collect();
    let (algorithm, digest) = match parts.as_slice() {
        [algorithm, digest] => (*algorithm, *digest),
        _ => return Err(Error::MalformedSignature),
    };
    if algorithm != ALGORITHM {
        return Err(Error::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let expected = sign(secret.unsecure(), body)?;
    if bool::from(expected.as_bytes().ct_eq(digest.as_bytes())) {
        Ok(())
    } else {
        Err(Error::SignatureMismatch)
    }
}

pub fn sign(key: &[u8], body: &[u8]) -> Result<String, Error> {
    let mut mac = Hmac::<Sha1>::new_varkey(key)
        .map_err(|err| Error::InternalVerificationError(err.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
