//! OGG页解析模块
//!
//! 容器探测、Opus解码和Opus元数据扫描共用的字节级页解析。
//! 所有由页头推导出的长度在使用前都经过校验，单页负载上限为 255×255 字节。

use crate::error::{AudioError, AudioResult};
use std::io::{self, Read, Seek, SeekFrom};

/// OGG页捕获模式
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// 固定页头长度
pub const PAGE_HEADER_LEN: usize = 27;

/// 单个lacing值的最大值，等于该值表示包在下一个段继续
const LACING_CONTINUE: u8 = 255;

/// 单页负载上限（255个段 × 每段255字节）
pub const MAX_PAGE_PAYLOAD: usize = 255 * 255;

/// 跨页重组的单个包上限
pub const MAX_PACKET_BYTES: usize = 4 * 1024 * 1024;

/// header_type 标志位
const FLAG_CONTINUED: u8 = 0x01;
const FLAG_BOS: u8 = 0x02;
const FLAG_EOS: u8 = 0x04;

/// 未设置granule position时的哨兵值
pub const GRANULE_UNSET: u64 = u64::MAX;

/// OGG页头（固定27字节布局）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub version: u8,
    pub header_type: u8,
    pub granule_position: u64,
    pub serial_number: u32,
    pub sequence_number: u32,
    pub checksum: u32,
    pub segment_count: u8,
}

impl PageHeader {
    /// 从27字节页头解析，捕获模式不匹配时返回 `MalformedContainer`
    pub fn parse(bytes: &[u8]) -> AudioResult<Self> {
        if bytes.len() < PAGE_HEADER_LEN {
            return Err(AudioError::MalformedContainer(format!(
                "页头截断: 仅有{}字节，需要{PAGE_HEADER_LEN}字节",
                bytes.len()
            )));
        }

        if &bytes[0..4] != CAPTURE_PATTERN {
            return Err(AudioError::MalformedContainer(format!(
                "不是OGG页 (捕获模式 {:02x?}，期望 {:02x?})",
                &bytes[0..4],
                CAPTURE_PATTERN
            )));
        }

        Ok(Self {
            version: bytes[4],
            header_type: bytes[5],
            granule_position: u64::from_le_bytes([
                bytes[6], bytes[7], bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13],
            ]),
            serial_number: u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]),
            sequence_number: u32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]),
            checksum: u32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]),
            segment_count: bytes[26],
        })
    }

    /// 本页首个包是否延续自上一页
    pub fn is_continuation(&self) -> bool {
        self.header_type & FLAG_CONTINUED != 0
    }

    pub fn is_bos(&self) -> bool {
        self.header_type & FLAG_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header_type & FLAG_EOS != 0
    }

    /// granule position（未设置时返回None）
    pub fn granule(&self) -> Option<u64> {
        (self.granule_position != GRANULE_UNSET).then_some(self.granule_position)
    }
}

/// 一个完整的OGG页
#[derive(Debug, Clone)]
pub struct OggPage {
    pub header: PageHeader,
    pub segment_table: Vec<u8>,
    pub payload: Vec<u8>,
}

/// 段表求和得到负载长度
pub fn payload_len(segment_table: &[u8]) -> usize {
    segment_table.iter().map(|&s| s as usize).sum()
}

/// 尽量读满缓冲区，返回实际读取的字节数（遇到EOF提前返回）
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// 读取页头与段表
///
/// 干净的EOF（页边界处没有更多字节）返回 `Ok(None)`；
/// 读到一半的页头或段表视为容器损坏。
pub fn read_page_header<R: Read>(reader: &mut R) -> AudioResult<Option<(PageHeader, Vec<u8>)>> {
    let mut header_bytes = [0u8; PAGE_HEADER_LEN];
    let n = read_up_to(reader, &mut header_bytes)?;
    if n == 0 {
        return Ok(None);
    }

    let header = PageHeader::parse(&header_bytes[..n])?;

    let mut segment_table = vec![0u8; header.segment_count as usize];
    let n = read_up_to(reader, &mut segment_table)?;
    if n < segment_table.len() {
        return Err(AudioError::MalformedContainer(format!(
            "段表截断: 读取{n}字节，声明{}字节",
            segment_table.len()
        )));
    }

    Ok(Some((header, segment_table)))
}

/// 读取完整的一页（页头 + 段表 + 负载）
pub fn read_page<R: Read>(reader: &mut R) -> AudioResult<Option<OggPage>> {
    let Some((header, segment_table)) = read_page_header(reader)? else {
        return Ok(None);
    };

    let size = payload_len(&segment_table);
    if size > MAX_PAGE_PAYLOAD {
        return Err(AudioError::MalformedContainer(format!(
            "页负载长度{size}超出上限{MAX_PAGE_PAYLOAD}"
        )));
    }

    let mut payload = vec![0u8; size];
    let n = read_up_to(reader, &mut payload)?;
    if n < size {
        return Err(AudioError::MalformedContainer(format!(
            "页负载截断: 读取{n}字节，声明{size}字节"
        )));
    }

    Ok(Some(OggPage {
        header,
        segment_table,
        payload,
    }))
}

/// 跳过当前页负载（仅需页头信息的扫描场景），返回跳过的字节数
///
/// `remaining` 为段表之后流中剩余的字节数，由调用方累计维护。
/// 使用相对seek，`BufReader` 在缓冲区内即可完成跳转。
pub fn skip_payload<R: Seek>(reader: &mut R, segment_table: &[u8], remaining: u64) -> AudioResult<u64> {
    let size = payload_len(segment_table) as u64;
    if size > remaining {
        return Err(AudioError::MalformedContainer(format!(
            "页负载截断: 剩余{remaining}字节，声明{size}字节"
        )));
    }
    reader.seek_relative(size as i64)?;
    Ok(size)
}

/// 逐页扫描页头，对每页调用 `visit`，负载直接跳过
///
/// 流长度只查询一次，扫描从当前位置开始。
pub fn scan_page_headers<R, F>(reader: &mut R, mut visit: F) -> AudioResult<()>
where
    R: Read + Seek,
    F: FnMut(&PageHeader),
{
    let mut position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;

    while let Some((header, segment_table)) = read_page_header(reader)? {
        position += (PAGE_HEADER_LEN + segment_table.len()) as u64;
        position += skip_payload(reader, &segment_table, end.saturating_sub(position))?;
        visit(&header);
    }
    Ok(())
}

/// 包重组器
///
/// 按lacing值把页负载切分为包：值为255的段表示包在下一段（可能是下一页）继续。
#[derive(Debug, Default)]
pub struct PacketAssembler {
    partial: Vec<u8>,
}

impl PacketAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送入一页，返回本页内完成的所有包
    pub fn push_page(&mut self, page: &OggPage) -> AudioResult<Vec<Vec<u8>>> {
        // 非延续页却有残留数据：上一页的包已丢失尾部，丢弃
        if !page.header.is_continuation() && !self.partial.is_empty() {
            tracing::warn!(
                bytes = self.partial.len(),
                sequence = page.header.sequence_number,
                "丢弃未完成的跨页OGG包"
            );
            self.partial.clear();
        }

        let mut packets = Vec::new();
        let mut offset = 0usize;

        for &lacing in &page.segment_table {
            let end = offset + lacing as usize;
            let segment = page.payload.get(offset..end).ok_or_else(|| {
                AudioError::MalformedContainer(format!(
                    "段越界: {offset}..{end}，负载{}字节",
                    page.payload.len()
                ))
            })?;

            if self.partial.len() + segment.len() > MAX_PACKET_BYTES {
                return Err(AudioError::MalformedContainer(format!(
                    "OGG包超出上限{MAX_PACKET_BYTES}字节"
                )));
            }
            self.partial.extend_from_slice(segment);
            offset = end;

            if lacing < LACING_CONTINUE {
                packets.push(std::mem::take(&mut self.partial));
            }
        }

        Ok(packets)
    }

    /// 是否有跨页未完成的包
    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }
}
