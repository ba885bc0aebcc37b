use std::fmt;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::assets::ShaderProgram;

/// Upper bound on named parameters per effect.
pub const MAX_EFFECT_PARAMS: usize = 8;

/// A float parameter of one to four components.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EffectParam {
    len: u8,
    values: [f32; 4],
}

impl EffectParam {
    pub const fn scalar(x: f32) -> Self {
        Self { len: 1, values: [x, 0.0, 0.0, 0.0] }
    }

    pub const fn vec2(x: f32, y: f32) -> Self {
        Self { len: 2, values: [x, y, 0.0, 0.0] }
    }

    pub const fn vec3(x: f32, y: f32, z: f32) -> Self {
        Self { len: 3, values: [x, y, z, 0.0] }
    }

    pub const fn vec4(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { len: 4, values: [x, y, z, w] }
    }

    /// Builds a parameter from a slice of one to four values.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        if values.is_empty() || values.len() > 4 {
            return None;
        }
        let mut out = [0.0; 4];
        out[..values.len()].copy_from_slice(values);
        Some(Self { len: values.len() as u8, values: out })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values[..self.len as usize]
    }
}

/// Uniform block bound at group 1 of every effect shader.
///
/// Parameter `i` (in insertion order) occupies `values[i]`; unused
/// components are zero.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct EffectUniform {
    pub values: [[f32; 4]; MAX_EFFECT_PARAMS],
}

/// Named parameters of one effect, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectParams {
    entries: Vec<(String, EffectParam)>,
}

impl EffectParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing an existing value in place.
    ///
    /// Returns `false` (and leaves the set unchanged) when a new name would
    /// exceed [`MAX_EFFECT_PARAMS`].
    pub fn set(&mut self, name: &str, param: EffectParam) -> bool {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            *slot = param;
            return true;
        }
        if self.entries.len() >= MAX_EFFECT_PARAMS {
            log::warn!("effect parameter `{name}` dropped: limit of {MAX_EFFECT_PARAMS} reached");
            return false;
        }
        self.entries.push((name.to_owned(), param));
        true
    }

    pub fn get(&self, name: &str) -> Option<EffectParam> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| *p)
    }

    pub fn remove(&mut self, name: &str) -> Option<EffectParam> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, EffectParam)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), *p))
    }

    pub fn pack(&self) -> EffectUniform {
        let mut out = EffectUniform::default();
        for (slot, (_, p)) in out.values.iter_mut().zip(&self.entries) {
            *slot = p.values;
        }
        out
    }
}

/// A fullscreen post-processing step: shader program plus parameters.
#[derive(Clone)]
pub struct Effect {
    program: Rc<ShaderProgram>,
    params: EffectParams,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("program", &self.program.key())
            .field("params", &self.params)
            .finish()
    }
}

impl Effect {
    pub fn new(program: Rc<ShaderProgram>) -> Self {
        Self { program, params: EffectParams::new() }
    }

    pub fn with_param(mut self, name: &str, param: EffectParam) -> Self {
        self.params.set(name, param);
        self
    }

    pub fn set_param(&mut self, name: &str, param: EffectParam) -> bool {
        self.params.set(name, param)
    }

    #[inline]
    pub fn program(&self) -> &Rc<ShaderProgram> {
        &self.program
    }

    #[inline]
    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    #[inline]
    pub fn params_mut(&mut self) -> &mut EffectParams {
        &mut self.params
    }
}

/// Inserts at `index`, or appends when `index` is past the end.
pub(crate) fn insert_or_push<T>(items: &mut Vec<T>, index: usize, item: T) {
    if index < items.len() {
        items.insert(index, item);
    } else {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_pack_in_insertion_order() {
        let mut p = EffectParams::new();
        p.set("radius", EffectParam::scalar(2.0));
        p.set("tint", EffectParam::vec3(1.0, 0.5, 0.25));
        p.set("dir", EffectParam::vec2(0.0, 1.0));

        let u = p.pack();
        assert_eq!(u.values[0], [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(u.values[1], [1.0, 0.5, 0.25, 0.0]);
        assert_eq!(u.values[2], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(u.values[3], [0.0; 4]);
    }

    #[test]
    fn replacing_keeps_position() {
        let mut p = EffectParams::new();
        p.set("a", EffectParam::scalar(1.0));
        p.set("b", EffectParam::scalar(2.0));
        p.set("a", EffectParam::scalar(3.0));
        assert_eq!(p.len(), 2);
        assert_eq!(p.pack().values[0][0], 3.0);
        assert_eq!(p.get("a"), Some(EffectParam::scalar(3.0)));
    }

    #[test]
    fn ninth_parameter_is_rejected() {
        let mut p = EffectParams::new();
        for i in 0..MAX_EFFECT_PARAMS {
            assert!(p.set(&format!("p{i}"), EffectParam::scalar(i as f32)));
        }
        assert!(!p.set("overflow", EffectParam::scalar(9.0)));
        assert_eq!(p.len(), MAX_EFFECT_PARAMS);
        // Existing names may still be updated.
        assert!(p.set("p0", EffectParam::scalar(-1.0)));
    }

    #[test]
    fn param_from_slice_bounds() {
        assert!(EffectParam::from_slice(&[]).is_none());
        assert!(EffectParam::from_slice(&[1.0; 5]).is_none());
        assert_eq!(EffectParam::from_slice(&[1.0, 2.0]).unwrap().values(), &[1.0, 2.0]);
    }

    #[test]
    fn insert_or_push_appends_past_end() {
        let mut v = vec![1, 2, 3];
        insert_or_push(&mut v, 1, 9);
        assert_eq!(v, vec![1, 9, 2, 3]);
        insert_or_push(&mut v, 100, 7);
        assert_eq!(v, vec![1, 9, 2, 3, 7]);
        insert_or_push(&mut v, 4, 5);
        assert_eq!(v, vec![1, 9, 2, 3, 5, 7]);
    }
}
