//! Spine 3.8 binary skeleton decoder.
//!
//! The binary format has no section lengths, so finding the animation names
//! means walking every section that precedes them. The walk validates
//! structure and indices as it goes but keeps only names; geometry and
//! timeline values are skipped.
//!
//! Multi-byte numbers are big-endian. Variable-length integers use 7-bit
//! groups with a continuation bit; signed ones are zigzag encoded.

use super::SkeletonError;

/// Versions this decoder understands.
const SUPPORTED_VERSION_PREFIX: &str = "3.8";

/// 3.8.75 shipped a layout that later 3.8 runtimes refuse to read.
const BROKEN_VERSION: &str = "3.8.75";

// Attachment types.
const ATTACHMENT_REGION: u8 = 0;
const ATTACHMENT_BOUNDING_BOX: u8 = 1;
const ATTACHMENT_MESH: u8 = 2;
const ATTACHMENT_LINKED_MESH: u8 = 3;
const ATTACHMENT_PATH: u8 = 4;
const ATTACHMENT_POINT: u8 = 5;
const ATTACHMENT_CLIPPING: u8 = 6;

// Slot timelines.
const SLOT_ATTACHMENT: u8 = 0;
const SLOT_COLOR: u8 = 1;
const SLOT_TWO_COLOR: u8 = 2;

// Bone timelines.
const BONE_ROTATE: u8 = 0;
const BONE_TRANSLATE: u8 = 1;
const BONE_SCALE: u8 = 2;
const BONE_SHEAR: u8 = 3;

// Path constraint timelines.
const PATH_POSITION: u8 = 0;
const PATH_SPACING: u8 = 1;
const PATH_MIX: u8 = 2;

// Curves.
const CURVE_LINEAR: u8 = 0;
const CURVE_STEPPED: u8 = 1;
const CURVE_BEZIER: u8 = 2;

/// Names recovered from a binary skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinarySkeleton {
    pub hash: Option<String>,
    pub version: String,
    pub bones: Vec<String>,
    pub slots: Vec<String>,
    pub skins: Vec<String>,
    pub events: Vec<String>,
    /// Animation names in file order, including any rest pose.
    pub animations: Vec<String>,
}

/// Decode a Spine 3.8 binary skeleton.
pub fn decode(data: &[u8]) -> Result<BinarySkeleton, SkeletonError> {
    Decoder::new(data).skeleton()
}

struct EventInfo {
    has_audio: bool,
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    section: &'static str,
    strings: Vec<String>,
    nonessential: bool,
    bone_count: usize,
    slot_count: usize,
    ik_count: usize,
    transform_count: usize,
    path_count: usize,
    skin_count: usize,
    events: Vec<EventInfo>,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            section: "header",
            strings: Vec::new(),
            nonessential: false,
            bone_count: 0,
            slot_count: 0,
            ik_count: 0,
            transform_count: 0,
            path_count: 0,
            skin_count: 0,
            events: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Primitives
    // -------------------------------------------------------------------------

    fn take(&mut self, len: usize) -> Result<&'a [u8], SkeletonError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(SkeletonError::Truncated {
                section: self.section,
                offset: self.pos,
            })?;
        let data = self.data;
        let bytes = &data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn skip(&mut self, count: usize, width: usize) -> Result<(), SkeletonError> {
        let len = count.checked_mul(width).ok_or(SkeletonError::Truncated {
            section: self.section,
            offset: self.pos,
        })?;
        self.take(len).map(|_| ())
    }

    fn byte(&mut self) -> Result<u8, SkeletonError> {
        Ok(self.take(1)?[0])
    }

    fn boolean(&mut self) -> Result<bool, SkeletonError> {
        Ok(self.byte()? != 0)
    }

    fn int(&mut self) -> Result<i32, SkeletonError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn float(&mut self) -> Result<f32, SkeletonError> {
        let bytes = self.take(4)?;
        Ok(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn floats(&mut self, count: usize) -> Result<(), SkeletonError> {
        self.skip(count, 4)
    }

    fn varint(&mut self, optimize_positive: bool) -> Result<i32, SkeletonError> {
        let mut result: u32 = 0;
        for group in 0..5 {
            let b = self.byte()?;
            if group == 4 {
                result |= u32::from(b) << 28;
                break;
            }
            result |= u32::from(b & 0x7F) << (7 * group);
            if b & 0x80 == 0 {
                break;
            }
        }
        if optimize_positive {
            Ok(result as i32)
        } else {
            Ok(((result >> 1) as i32) ^ -((result & 1) as i32))
        }
    }

    fn count(&mut self) -> Result<usize, SkeletonError> {
        Ok(self.varint(true)? as u32 as usize)
    }

    fn index(&mut self, what: &'static str, len: usize) -> Result<usize, SkeletonError> {
        let index = self.count()?;
        if index >= len {
            return Err(SkeletonError::IndexOutOfRange { what, index, len });
        }
        Ok(index)
    }

    fn string(&mut self) -> Result<Option<String>, SkeletonError> {
        let offset = self.pos;
        match self.count()? {
            0 => Ok(None),
            1 => Ok(Some(String::new())),
            byte_count => {
                let bytes = self.take(byte_count - 1)?;
                String::from_utf8(bytes.to_vec())
                    .map(Some)
                    .map_err(|_| SkeletonError::InvalidUtf8 { offset })
            }
        }
    }

    fn required_string(&mut self) -> Result<String, SkeletonError> {
        Ok(self.string()?.unwrap_or_default())
    }

    fn string_ref(&mut self) -> Result<Option<String>, SkeletonError> {
        match self.count()? {
            0 => Ok(None),
            index => self
                .strings
                .get(index - 1)
                .cloned()
                .map(Some)
                .ok_or(SkeletonError::IndexOutOfRange {
                    what: "string",
                    index: index - 1,
                    len: self.strings.len(),
                }),
        }
    }

    fn short_array(&mut self) -> Result<(), SkeletonError> {
        let n = self.count()?;
        self.skip(n, 2)
    }

    fn vertices(&mut self, vertex_count: usize) -> Result<(), SkeletonError> {
        if !self.boolean()? {
            return self.floats(vertex_count.saturating_mul(2));
        }
        for _ in 0..vertex_count {
            let bone_count = self.count()?;
            for _ in 0..bone_count {
                self.index("bone", self.bone_count)?;
                self.floats(3)?;
            }
        }
        Ok(())
    }

    fn curve(&mut self, frame: usize, frame_count: usize) -> Result<(), SkeletonError> {
        if frame + 1 >= frame_count {
            return Ok(());
        }
        match self.byte()? {
            CURVE_LINEAR | CURVE_STEPPED => Ok(()),
            CURVE_BEZIER => self.floats(4),
            other => Err(SkeletonError::UnknownType {
                what: "curve",
                value: other,
            }),
        }
    }

    fn index_list(&mut self, what: &'static str, len: usize) -> Result<(), SkeletonError> {
        let n = self.count()?;
        for _ in 0..n {
            self.index(what, len)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sections
    // -------------------------------------------------------------------------

    fn skeleton(mut self) -> Result<BinarySkeleton, SkeletonError> {
        let hash = self.string()?.filter(|h| !h.is_empty());
        let version = self.required_string()?;
        if !version.starts_with(SUPPORTED_VERSION_PREFIX) || version == BROKEN_VERSION {
            return Err(SkeletonError::UnsupportedVersion(version));
        }
        self.floats(4)?;
        self.nonessential = self.boolean()?;
        if self.nonessential {
            self.floats(1)?;
            self.string()?;
            self.string()?;
        }

        self.section = "strings";
        let n = self.count()?;
        for _ in 0..n {
            let s = self.required_string()?;
            self.strings.push(s);
        }

        let bones = self.bones()?;
        let slots = self.slots()?;
        self.constraints()?;

        self.section = "skins";
        let mut skins = Vec::new();
        if self.skin(true)? {
            skins.push("default".to_string());
        }
        let named = self.count()?;
        // Skin lists and deform timelines index skins with the default skin first.
        self.skin_count = skins.len() + named;
        for _ in 0..named {
            let name = self.string_ref()?.unwrap_or_default();
            self.skin(false)?;
            skins.push(name);
        }

        let events = self.events()?;

        self.section = "animations";
        let n = self.count()?;
        let mut animations = Vec::new();
        for _ in 0..n {
            let name = self.required_string()?;
            self.animation()?;
            animations.push(name);
        }

        Ok(BinarySkeleton {
            hash,
            version,
            bones,
            slots,
            skins,
            events,
            animations,
        })
    }

    fn bones(&mut self) -> Result<Vec<String>, SkeletonError> {
        self.section = "bones";
        let n = self.count()?;
        let mut names = Vec::new();
        for i in 0..n {
            names.push(self.required_string()?);
            if i > 0 {
                self.index("parent bone", i)?;
            }
            // rotation, x, y, scaleX, scaleY, shearX, shearY, length
            self.floats(8)?;
            self.count()?;
            self.boolean()?;
            if self.nonessential {
                self.int()?;
            }
        }
        self.bone_count = n;
        Ok(names)
    }

    fn slots(&mut self) -> Result<Vec<String>, SkeletonError> {
        self.section = "slots";
        let n = self.count()?;
        let mut names = Vec::new();
        for _ in 0..n {
            names.push(self.required_string()?);
            self.index("bone", self.bone_count)?;
            self.int()?;
            self.int()?;
            self.string_ref()?;
            self.count()?;
        }
        self.slot_count = n;
        Ok(names)
    }

    fn constraints(&mut self) -> Result<(), SkeletonError> {
        self.section = "ik constraints";
        self.ik_count = self.count()?;
        for _ in 0..self.ik_count {
            self.constraint_head()?;
            self.index("ik target", self.bone_count)?;
            // mix, softness
            self.floats(2)?;
            self.byte()?;
            // compress, stretch, uniform
            self.skip(3, 1)?;
        }

        self.section = "transform constraints";
        self.transform_count = self.count()?;
        for _ in 0..self.transform_count {
            self.constraint_head()?;
            self.index("transform target", self.bone_count)?;
            // local, relative
            self.skip(2, 1)?;
            // six offsets then four mixes
            self.floats(10)?;
        }

        self.section = "path constraints";
        self.path_count = self.count()?;
        for _ in 0..self.path_count {
            self.constraint_head()?;
            self.index("path target", self.slot_count)?;
            // position, spacing and rotate modes
            self.count()?;
            self.count()?;
            self.count()?;
            // offsetRotation, position, spacing, rotateMix, translateMix
            self.floats(5)?;
        }
        Ok(())
    }

    fn constraint_head(&mut self) -> Result<(), SkeletonError> {
        self.string()?;
        self.count()?;
        self.boolean()?;
        self.index_list("constrained bone", self.bone_count)
    }

    /// Returns `false` for an absent default skin.
    fn skin(&mut self, default_skin: bool) -> Result<bool, SkeletonError> {
        let slot_count = if default_skin {
            let n = self.count()?;
            if n == 0 {
                return Ok(false);
            }
            n
        } else {
            self.index_list("skin bone", self.bone_count)?;
            self.index_list("skin ik constraint", self.ik_count)?;
            self.index_list("skin transform constraint", self.transform_count)?;
            self.index_list("skin path constraint", self.path_count)?;
            self.count()?
        };

        for _ in 0..slot_count {
            self.index("skin slot", self.slot_count)?;
            let attachments = self.count()?;
            for _ in 0..attachments {
                // Key under which the attachment is stored in the skin.
                self.string_ref()?;
                self.attachment()?;
            }
        }
        Ok(true)
    }

    fn attachment(&mut self) -> Result<(), SkeletonError> {
        // Attachment name, defaulting to the key when absent.
        self.string_ref()?;
        match self.byte()? {
            ATTACHMENT_REGION => {
                self.string_ref()?;
                // rotation, x, y, scaleX, scaleY, width, height
                self.floats(7)?;
                self.int()?;
            }
            ATTACHMENT_BOUNDING_BOX => {
                let vertex_count = self.count()?;
                self.vertices(vertex_count)?;
                self.nonessential_color()?;
            }
            ATTACHMENT_MESH => {
                self.string_ref()?;
                self.int()?;
                let vertex_count = self.count()?;
                self.floats(vertex_count.saturating_mul(2))?;
                self.short_array()?;
                self.vertices(vertex_count)?;
                self.count()?;
                if self.nonessential {
                    self.short_array()?;
                    self.floats(2)?;
                }
            }
            ATTACHMENT_LINKED_MESH => {
                self.string_ref()?;
                self.int()?;
                self.string_ref()?;
                self.string_ref()?;
                self.boolean()?;
                if self.nonessential {
                    self.floats(2)?;
                }
            }
            ATTACHMENT_PATH => {
                // closed, constantSpeed
                self.skip(2, 1)?;
                let vertex_count = self.count()?;
                self.vertices(vertex_count)?;
                self.floats(vertex_count / 3)?;
                self.nonessential_color()?;
            }
            ATTACHMENT_POINT => {
                self.floats(3)?;
                self.nonessential_color()?;
            }
            ATTACHMENT_CLIPPING => {
                self.index("clipping end slot", self.slot_count)?;
                let vertex_count = self.count()?;
                self.vertices(vertex_count)?;
                self.nonessential_color()?;
            }
            other => {
                return Err(SkeletonError::UnknownType {
                    what: "attachment",
                    value: other,
                })
            }
        }
        Ok(())
    }

    fn nonessential_color(&mut self) -> Result<(), SkeletonError> {
        if self.nonessential {
            self.int()?;
        }
        Ok(())
    }

    fn events(&mut self) -> Result<Vec<String>, SkeletonError> {
        self.section = "events";
        let n = self.count()?;
        let mut names = Vec::new();
        for _ in 0..n {
            names.push(self.string_ref()?.unwrap_or_default());
            self.varint(false)?;
            self.float()?;
            self.string()?;
            let has_audio = self.string()?.is_some();
            if has_audio {
                // volume, balance
                self.floats(2)?;
            }
            self.events.push(EventInfo { has_audio });
        }
        Ok(names)
    }

    fn animation(&mut self) -> Result<(), SkeletonError> {
        // Slot timelines.
        let n = self.count()?;
        for _ in 0..n {
            self.index("timeline slot", self.slot_count)?;
            let timelines = self.count()?;
            for _ in 0..timelines {
                let kind = self.byte()?;
                let frames = self.count()?;
                match kind {
                    SLOT_ATTACHMENT => {
                        for _ in 0..frames {
                            self.float()?;
                            self.string_ref()?;
                        }
                    }
                    SLOT_COLOR => {
                        for frame in 0..frames {
                            self.float()?;
                            self.int()?;
                            self.curve(frame, frames)?;
                        }
                    }
                    SLOT_TWO_COLOR => {
                        for frame in 0..frames {
                            self.float()?;
                            self.int()?;
                            self.int()?;
                            self.curve(frame, frames)?;
                        }
                    }
                    other => return Err(unknown_timeline("slot timeline", other)),
                }
            }
        }

        // Bone timelines.
        let n = self.count()?;
        for _ in 0..n {
            self.index("timeline bone", self.bone_count)?;
            let timelines = self.count()?;
            for _ in 0..timelines {
                let kind = self.byte()?;
                let frames = self.count()?;
                let values = match kind {
                    BONE_ROTATE => 1,
                    BONE_TRANSLATE | BONE_SCALE | BONE_SHEAR => 2,
                    other => return Err(unknown_timeline("bone timeline", other)),
                };
                for frame in 0..frames {
                    self.floats(1 + values)?;
                    self.curve(frame, frames)?;
                }
            }
        }

        // IK constraint timelines.
        let n = self.count()?;
        for _ in 0..n {
            self.index("timeline ik constraint", self.ik_count)?;
            let frames = self.count()?;
            for frame in 0..frames {
                // time, mix, softness
                self.floats(3)?;
                self.byte()?;
                // compress, stretch
                self.skip(2, 1)?;
                self.curve(frame, frames)?;
            }
        }

        // Transform constraint timelines.
        let n = self.count()?;
        for _ in 0..n {
            self.index("timeline transform constraint", self.transform_count)?;
            let frames = self.count()?;
            for frame in 0..frames {
                self.floats(5)?;
                self.curve(frame, frames)?;
            }
        }

        // Path constraint timelines.
        let n = self.count()?;
        for _ in 0..n {
            self.index("timeline path constraint", self.path_count)?;
            let timelines = self.count()?;
            for _ in 0..timelines {
                let kind = self.byte()?;
                let frames = self.count()?;
                let values = match kind {
                    PATH_POSITION | PATH_SPACING => 1,
                    PATH_MIX => 2,
                    other => return Err(unknown_timeline("path timeline", other)),
                };
                for frame in 0..frames {
                    self.floats(1 + values)?;
                    self.curve(frame, frames)?;
                }
            }
        }

        // Deform timelines.
        let n = self.count()?;
        for _ in 0..n {
            self.index("deform skin", self.skin_count)?;
            let slots = self.count()?;
            for _ in 0..slots {
                self.index("deform slot", self.slot_count)?;
                let timelines = self.count()?;
                for _ in 0..timelines {
                    self.string_ref()?;
                    let frames = self.count()?;
                    for frame in 0..frames {
                        self.float()?;
                        let end = self.count()?;
                        if end != 0 {
                            self.count()?;
                            self.floats(end)?;
                        }
                        self.curve(frame, frames)?;
                    }
                }
            }
        }

        // Draw order timeline.
        let n = self.count()?;
        for _ in 0..n {
            self.float()?;
            let offsets = self.count()?;
            for _ in 0..offsets {
                self.index("draw order slot", self.slot_count)?;
                self.count()?;
            }
        }

        // Event timeline.
        let n = self.count()?;
        for _ in 0..n {
            self.float()?;
            let event = self.index("event", self.events.len())?;
            self.varint(false)?;
            self.float()?;
            if self.boolean()? {
                self.string()?;
            }
            if self.events[event].has_audio {
                self.floats(2)?;
            }
        }
        Ok(())
    }
}

fn unknown_timeline(what: &'static str, value: u8) -> SkeletonError {
    SkeletonError::UnknownType { what, value }
}
