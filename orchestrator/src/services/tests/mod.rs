//! Service-specific tests


pub mod common {
    use bytes::Bytes;
    use futures_util::stream;

    use crate::traits::ByteStream;

    /// Body made of the given chunks
    pub fn chunked_body(chunks: &[&'static str]) -> ByteStream {
        let items: Vec<std::io::Result<Bytes>> = chunks.iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();
        Box::pin(stream::iter(items))
    }

    /// Body whose stream breaks after the first chunk
    pub fn broken_body(first: &'static str) -> ByteStream {
        let items: Vec<std::io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(first.as_bytes())),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
        ];
        Box::pin(stream::iter(items))
    }
}
