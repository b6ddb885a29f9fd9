//! `tswift://` swarm URIs: `tswift://host:port/<root-hash-hex>[$<chunk-size>]`.

use swift_hash::Hash;

/// A parsed `tswift://` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwarmUri {
    pub host: Option<String>,
    pub root_hash: Hash,
    pub chunk_size: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum UriError {
    #[error("not a tswift:// uri")]
    BadScheme,
    #[error("missing root hash")]
    MissingRootHash,
    #[error("invalid root hash: {0}")]
    InvalidHash(#[from] swift_hash::HashParseError),
    #[error("invalid chunk size suffix")]
    InvalidChunkSize,
}

pub fn parse(uri: &str) -> Result<SwarmUri, UriError> {
    let rest = uri.strip_prefix("tswift://").ok_or(UriError::BadScheme)?;
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = if authority.is_empty() {
        None
    } else {
        Some(authority.to_string())
    };
    if path.is_empty() {
        return Err(UriError::MissingRootHash);
    }
    let (hex, chunk_size) = match path.split_once('$') {
        Some((hex, size)) => {
            let size: u32 = size.parse().map_err(|_| UriError::InvalidChunkSize)?;
            (hex, Some(size))
        }
        None => (path, None),
    };
    Ok(SwarmUri {
        host,
        root_hash: Hash::from_hex(hex)?,
        chunk_size,
    })
}

/// Render a URI. Omits the chunk-size suffix when it's the default
/// (matching clients that generate with the suffix omitted iff default).
pub fn format(host: Option<&str>, root_hash: Hash, chunk_size: u32, default_chunk_size: u32) -> String {
    let host = host.unwrap_or("");
    if chunk_size == default_chunk_size {
        format!("tswift://{host}/{}", root_hash.to_hex())
    } else {
        format!("tswift://{host}/{}${chunk_size}", root_hash.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_default_chunk_size() {
        let hash = Hash::of_data(b"x");
        let uri = format(Some("peer:7000"), hash, 1024, 1024);
        let parsed = parse(&uri).unwrap();
        assert_eq!(parsed.root_hash, hash);
        assert_eq!(parsed.chunk_size, None);
    }

    #[test]
    fn roundtrips_nondefault_chunk_size() {
        let hash = Hash::of_data(b"y");
        let uri = format(None, hash, 4096, 1024);
        let parsed = parse(&uri).unwrap();
        assert_eq!(parsed.chunk_size, Some(4096));
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(parse("http://x/y"), Err(UriError::BadScheme)));
    }
}
