/*!
Provides IO utility functions for reading bytes of different lengths and
converting them to the corresponding structs.

All reads are bounds-checked against the remaining buffer length and all
integers are read in network byte order.
*/
use crate::error::ParserError;
use crate::models::*;
use bytes::{Buf, Bytes};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub trait ReadUtils: Buf {
    #[inline]
    fn has_n_remaining(&self, n: usize) -> Result<(), ParserError> {
        if self.remaining() < n {
            Err(ParserError::TruncatedMsg(format!(
                "truncated message: want to read {} bytes, have {} bytes available",
                n,
                self.remaining()
            )))
        } else {
            Ok(())
        }
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8, ParserError> {
        self.has_n_remaining(1)?;
        Ok(self.get_u8())
    }

    #[inline]
    fn read_u16(&mut self) -> Result<u16, ParserError> {
        self.has_n_remaining(2)?;
        Ok(self.get_u16())
    }

    #[inline]
    fn read_u32(&mut self) -> Result<u32, ParserError> {
        self.has_n_remaining(4)?;
        Ok(self.get_u32())
    }

    #[inline]
    fn read_u64(&mut self) -> Result<u64, ParserError> {
        self.has_n_remaining(8)?;
        Ok(self.get_u64())
    }

    #[inline]
    fn read_u128(&mut self) -> Result<u128, ParserError> {
        self.has_n_remaining(16)?;
        Ok(self.get_u128())
    }

    fn read_address(&mut self, afi: &Afi) -> Result<IpAddr, ParserError> {
        match afi {
            Afi::Ipv4 => self.read_ipv4_address().map(IpAddr::V4),
            Afi::Ipv6 => self.read_ipv6_address().map(IpAddr::V6),
        }
    }

    fn read_ipv4_address(&mut self) -> Result<Ipv4Addr, ParserError> {
        let addr = self.read_u32()?;
        Ok(Ipv4Addr::from(addr))
    }

    fn read_ipv6_address(&mut self) -> Result<Ipv6Addr, ParserError> {
        let buf = self.read_u128()?;
        Ok(Ipv6Addr::from(buf))
    }

    fn read_asn(&mut self, as_length: &AsnLength) -> Result<Asn, ParserError> {
        match as_length {
            AsnLength::Bits16 => Ok(Asn::new_16bit(self.read_u16()?)),
            AsnLength::Bits32 => Ok(Asn::new_32bit(self.read_u32()?)),
        }
    }

    fn read_afi(&mut self) -> Result<Afi, ParserError> {
        let afi = self.read_u16()?;
        Afi::try_from(afi).map_err(ParserError::from)
    }

    fn read_safi(&mut self) -> Result<Safi, ParserError> {
        let safi = self.read_u8()?;
        Safi::try_from(safi).map_err(ParserError::from)
    }

    fn read_n_bytes(&mut self, n_bytes: usize) -> Result<Vec<u8>, ParserError> {
        self.has_n_remaining(n_bytes)?;
        let mut buffer = vec![0; n_bytes];
        self.copy_to_slice(&mut buffer);
        Ok(buffer)
    }

    fn read_n_bytes_to_string(&mut self, n_bytes: usize) -> Result<String, ParserError> {
        let buffer = self.read_n_bytes(n_bytes)?;
        Ok(buffer.into_iter().map(|x: u8| x as char).collect::<String>())
    }

    /// Read one NLRI prefix: length in bits, then `ceil(len/8)` address bytes
    /// zero-extended to the full address width.
    fn read_nlri_prefix(&mut self, afi: &Afi) -> Result<Prefix, ParserError> {
        let bit_len = self.read_u8()?;
        let byte_len: usize = (bit_len as usize).div_ceil(8);

        let addr: IpAddr = match afi {
            Afi::Ipv4 => {
                if byte_len > 4 {
                    return Err(ParserError::InvalidPrefix(format!(
                        "invalid byte length for IPv4 prefix: byte_len: {byte_len}, bit_len: {bit_len}"
                    )));
                }
                self.has_n_remaining(byte_len)?;
                let mut buff = [0; 4];
                self.copy_to_slice(&mut buff[..byte_len]);
                IpAddr::V4(Ipv4Addr::from(buff))
            }
            Afi::Ipv6 => {
                if byte_len > 16 {
                    return Err(ParserError::InvalidPrefix(format!(
                        "invalid byte length for IPv6 prefix: byte_len: {byte_len}, bit_len: {bit_len}"
                    )));
                }
                self.has_n_remaining(byte_len)?;
                let mut buff = [0; 16];
                self.copy_to_slice(&mut buff[..byte_len]);
                IpAddr::V6(Ipv6Addr::from(buff))
            }
        };

        Prefix::new(addr, bit_len)
    }

    /// Split off the next `n` bytes as an independent buffer and advance the
    /// cursor past them.
    fn split_n(&mut self, n: usize) -> Result<Bytes, ParserError>;
}

impl ReadUtils for Bytes {
    fn split_n(&mut self, n: usize) -> Result<Bytes, ParserError> {
        self.has_n_remaining(n)?;
        Ok(self.split_to(n))
    }
}
