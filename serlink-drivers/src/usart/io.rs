//! Byte-stream trait implementations

use serlink_hal::{DmaStream, UartRx, UartTx, UsartPort};

use super::{TransferError, Usart};

/// Largest chunk one `write` call hands to the engine
const MAX_CHUNK: usize = u16::MAX as usize;

impl<'d, P: UsartPort, D: DmaStream<'d>> UartTx for Usart<'d, P, D> {
    type Error = TransferError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        data.chunks(MAX_CHUNK).try_for_each(|chunk| self.send(chunk))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flush_blocking();
        Ok(())
    }
}

impl<'d, P: UsartPort, D: DmaStream<'d>> UartRx for Usart<'d, P, D> {
    type Error = TransferError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        buf.chunks_mut(MAX_CHUNK).try_for_each(|chunk| self.receive(chunk))?;
        Ok(buf.len())
    }
}

impl<'d, P: UsartPort, D: DmaStream<'d>> embedded_io::ErrorType for Usart<'d, P, D> {
    type Error = TransferError;
}

impl<'d, P: UsartPort, D: DmaStream<'d>> embedded_io::Write for Usart<'d, P, D> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(MAX_CHUNK);
        self.send(&buf[..n])?;
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flush_blocking();
        Ok(())
    }
}

impl<'d, P: UsartPort, D: DmaStream<'d>> embedded_io::Read for Usart<'d, P, D> {
    /// Blocks for one byte; there is no receive FIFO to drain beyond it
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.receive(&mut buf[..1])?;
        Ok(1)
    }
}

impl<'d, P: UsartPort, D: DmaStream<'d>> embedded_io_async::Write for Usart<'d, P, D> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(MAX_CHUNK);
        self.send_async(&buf[..n]).await?;
        Ok(n)
    }
}

impl<'d, P: UsartPort, D: DmaStream<'d>> embedded_io_async::Read for Usart<'d, P, D> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.receive_async(&mut buf[..1]).await?;
        Ok(1)
    }
}
